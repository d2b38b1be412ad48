use anyhow::Context as _;
use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use url::Url;

use crate::formats::FetchedPage;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage>;
}

/// Renders a single page with `spider` and keeps both the markup and a Markdown view of it.
#[derive(Debug, Clone, Default)]
pub struct SpiderFetcher;

#[async_trait]
impl PageFetcher for SpiderFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage> {
        let parsed = Url::parse(url).with_context(|| format!("parse page url: {url}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("page url must be http/https: {parsed}");
        }

        let mut website = spider::website::Website::new(parsed.as_str());
        website.configuration.respect_robots_txt = false;
        website.configuration.subdomains = false;
        website.configuration.tld = false;
        website.with_block_assets(true);
        website.with_limit(1);

        // `scrape()` can finish before its page buffer is drained, so take pages off the
        // subscription instead.
        let mut rx = website.subscribe(16);
        let collector = tokio::spawn(async move {
            let mut pages = Vec::new();
            loop {
                match rx.recv().await {
                    Ok(page) => pages.push(page),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "page subscription lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            pages
        });

        website.crawl().await;
        website.unsubscribe();

        let pages = collector.await.context("join crawler page collector")?;
        let page = pages
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("crawler returned no page for {url}"))?;

        let status = page.status_code.as_u16();
        if !(200..300).contains(&status) {
            anyhow::bail!("GET {url} returned status {status}");
        }

        let html = page.get_html();
        if html.trim().is_empty() {
            anyhow::bail!("GET {url} returned an empty body");
        }

        Ok(FetchedPage {
            url: url.to_owned(),
            markdown: html2md::parse_html(&html),
            html,
        })
    }
}

/// Page 1 is the catalogue root; later pages live under `catalogue/page-{n}.html`.
pub fn catalogue_page_url(base_url: &Url, page: usize) -> anyhow::Result<Url> {
    if page <= 1 {
        return Ok(base_url.clone());
    }
    base_url
        .join(&format!("catalogue/page-{page}.html"))
        .with_context(|| format!("build catalogue url for page {page}"))
}

pub fn catalogue_page_urls(base_url: &str, pages: usize) -> anyhow::Result<Vec<Url>> {
    let mut base = Url::parse(base_url).with_context(|| format!("parse base url: {base_url}"))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        anyhow::bail!("base url must be http/https: {base}");
    }
    // `Url::join` drops the last path segment unless the base ends with '/'.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    (1..=pages)
        .map(|page| catalogue_page_url(&base, page))
        .collect()
}

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use url::Url;

use crate::caption::{HfCaptionConfig, HfCaptioner, ImageCaptioner, NoopCaptioner};
use crate::cli::{CaptionEngine, RunArgs};
use crate::crawl::{PageFetcher, SpiderFetcher};
use crate::formats::{BookRecord, FetchedPage};
use crate::openai::{ChatCompletionClient, ChatCompletionConfig, CompletionClient};

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    if args.pages == 0 {
        anyhow::bail!("--pages must be >= 1");
    }
    let urls = crate::crawl::catalogue_page_urls(&args.base_url, args.pages)
        .context("build catalogue page urls")?;

    let api_key = std::env::var("HF_TOKEN").map_err(|_| anyhow::anyhow!("HF_TOKEN is not set"))?;

    let llm = ChatCompletionClient::new(ChatCompletionConfig {
        base_url: args.llm_base_url.clone(),
        api_key: api_key.clone(),
        model: args.llm_model.clone(),
        max_tokens: args.llm_max_tokens,
        timeout: Duration::from_secs(args.llm_timeout_secs),
    })?;

    let captioner: Box<dyn ImageCaptioner> = match args.caption_engine {
        CaptionEngine::Noop => Box::new(NoopCaptioner),
        CaptionEngine::Hf => Box::new(HfCaptioner::new(HfCaptionConfig {
            base_url: args.caption_base_url.clone(),
            api_key,
            model: args.caption_model.clone(),
            timeout: Duration::from_secs(args.caption_timeout_secs),
        })?),
    };

    let started_at = Instant::now();
    tracing::info!(
        started_at = %chrono::Utc::now().to_rfc3339(),
        pages = urls.len(),
        llm_model = %args.llm_model,
        caption_engine = ?args.caption_engine,
        "run: start"
    );

    let books = collect_books(&SpiderFetcher, &llm, captioner.as_ref(), &urls).await;

    if books.is_empty() {
        tracing::warn!("no books were extracted from any page; nothing saved");
    } else {
        let csv_path = PathBuf::from(&args.csv);
        let json_path = PathBuf::from(&args.json);
        crate::export::write_csv(&books, &csv_path).context("save csv")?;
        crate::export::write_json(&books, &json_path).context("save json")?;
    }

    tracing::info!(
        records = books.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "run: done"
    );
    Ok(())
}

/// Runs every page through fetch, completion, parse and enrichment, in order.
///
/// A page whose fetch or completion fails is logged and skipped; the
/// records of the other pages are still returned.
pub async fn collect_books(
    fetcher: &dyn PageFetcher,
    llm: &dyn CompletionClient,
    captioner: &dyn ImageCaptioner,
    urls: &[Url],
) -> Vec<BookRecord> {
    let mut all_books = Vec::new();

    for (idx, url) in urls.iter().enumerate() {
        let page_no = idx + 1;
        tracing::info!(page = page_no, url = %url, "crawl: start");

        let page = match fetcher.fetch(url.as_str()).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(page = page_no, url = %url, error = %format!("{err:#}"), "crawl failed; skipping page");
                continue;
            }
        };
        tracing::info!(page = page_no, "crawl: done");

        let prompt = crate::prompt::extraction_prompt(&page.markdown);
        let completion = match llm.complete(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(page = page_no, url = %url, error = %format!("{err:#}"), "llm call failed; skipping page");
                continue;
            }
        };
        tracing::info!(page = page_no, "llm: done");
        tracing::debug!(page = page_no, response = %completion, "llm response");

        let mut books = crate::extract::extract_books(&completion);
        if books.is_empty() {
            tracing::warn!(page = page_no, url = %url, "no books extracted from page");
            continue;
        }

        for book in &mut books {
            enrich_book(book, &page, captioner).await;
            tracing::info!(
                page = page_no,
                title = %book.title,
                price = %book.price,
                rating = %book.rating,
                availability = %book.availability,
                cover = %book.cover_url,
                "book"
            );
        }
        all_books.append(&mut books);
    }

    all_books
}

async fn enrich_book(book: &mut BookRecord, page: &FetchedPage, captioner: &dyn ImageCaptioner) {
    if book.has_sentinel_rating() && !page.html.is_empty() {
        book.rating = crate::rating::rating_from_html(&page.html, &book.title);
        tracing::debug!(title = %book.title, rating = %book.rating, "rating backfilled from markup");
    }

    let cover_url = book.cover_url.trim();
    if cover_url.is_empty() {
        book.cover_interpretation = String::new();
        return;
    }

    let image_url = resolve_cover_url(&page.url, cover_url);
    book.cover_interpretation = captioner.caption(&image_url).await;
    tracing::info!(title = %book.title, caption = %book.cover_interpretation, "cover interpreted");
}

/// Model output often carries cover paths relative to the page.
fn resolve_cover_url(page_url: &str, cover_url: &str) -> String {
    if let Ok(absolute) = Url::parse(cover_url) {
        return absolute.to_string();
    }
    match Url::parse(page_url).and_then(|base| base.join(cover_url)) {
        Ok(joined) => joined.to_string(),
        Err(_) => cover_url.to_owned(),
    }
}

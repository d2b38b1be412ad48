use std::sync::LazyLock;

use anyhow::Context as _;
use scraper::{Html, Selector};

use crate::cli::RatingArgs;
use crate::formats::RATING_NOT_AVAILABLE;

static PRODUCT_POD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.product_pod").expect("valid selector"));
static TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3 a").expect("valid selector"));
static STAR_RATING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.star-rating").expect("valid selector"));

pub fn run(args: RatingArgs) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(&args.html)
        .with_context(|| format!("read page markup: {}", &args.html))?;
    println!("{}", rating_from_html(&html, &args.title));
    Ok(())
}

/// Looks up the star rating of the listing whose link title equals `title`.
///
/// Titles are compared after trimming; any other divergence misses. Returns
/// [`RATING_NOT_AVAILABLE`] when no listing matches.
pub fn rating_from_html(html: &str, title: &str) -> String {
    let wanted = title.trim();
    let document = Html::parse_document(html);

    for article in document.select(&PRODUCT_POD) {
        let Some(link) = article.select(&TITLE_LINK).next() else {
            continue;
        };
        if link.value().attr("title").unwrap_or_default().trim() != wanted {
            continue;
        }

        let Some(rating) = article.select(&STAR_RATING).next() else {
            continue;
        };
        if let Some(label) = rating
            .value()
            .classes()
            .find(|class| !class.eq_ignore_ascii_case("star-rating"))
        {
            return label.to_owned();
        }
    }

    RATING_NOT_AVAILABLE.to_owned()
}

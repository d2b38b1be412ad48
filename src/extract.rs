use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

use crate::cli::ParseArgs;
use crate::formats::BookRecord;

static BOOK_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)[*-]\s*Title:\s*(?P<title>.+?)\n\s*Price:\s*(?P<price>.+?)\n\s*Rating:\s*(?P<rating>.+?)\n",
        r"\s*Availability:\s*(?P<availability>.+?)\n\s*Cover:\s*(?P<cover_url>.+?)(?:\n|$)",
    ))
    .expect("book bullet pattern is valid")
});

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read completion text: {}", &args.input))?;

    let books = extract_books(&input);
    tracing::info!(records = books.len(), input = %args.input, "parse");

    let json = serde_json::to_string_pretty(&books).context("serialize records")?;
    match args.out.as_deref() {
        Some(out) => {
            let out = PathBuf::from(out);
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir: {}", parent.display()))?;
            }
            std::fs::write(&out, format!("{json}\n"))
                .with_context(|| format!("write records: {}", out.display()))?;
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// Pulls every well-formed `- Title: ... Cover: ...` block out of model output.
///
/// Blocks whose labels are missing, reordered or differently cased are skipped.
pub fn extract_books(text: &str) -> Vec<BookRecord> {
    BOOK_BULLET
        .captures_iter(text)
        .map(|caps| {
            let field = |name: &str| {
                caps.name(name)
                    .map(|m| m.as_str().trim().to_owned())
                    .unwrap_or_default()
            };
            BookRecord {
                title: field("title"),
                price: field("price"),
                rating: field("rating"),
                availability: field("availability"),
                cover_url: field("cover_url"),
                cover_interpretation: String::new(),
            }
        })
        .collect()
}

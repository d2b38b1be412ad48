use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize as _;

use crate::formats::BookRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn write_csv(books: &[BookRecord], path: &Path) -> anyhow::Result<()> {
    create_parent_dir(path)?;

    let file = File::create(path).with_context(|| format!("create csv: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)
        .with_context(|| format!("write csv bom: {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);
    // Header comes from `BookRecord`'s field order.
    for book in books {
        writer
            .serialize(book)
            .with_context(|| format!("write csv record: {}", path.display()))?;
    }
    if books.is_empty() {
        writer
            .write_record(crate::formats::BOOK_FIELDS)
            .with_context(|| format!("write csv header: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush csv: {}", path.display()))?;

    tracing::info!(path = %path.display(), records = books.len(), "saved csv");
    Ok(())
}

pub fn write_json(books: &[BookRecord], path: &Path) -> anyhow::Result<()> {
    create_parent_dir(path)?;

    let file = File::create(path).with_context(|| format!("create json: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    books
        .serialize(&mut serializer)
        .with_context(|| format!("serialize json: {}", path.display()))?;
    out.flush()
        .with_context(|| format!("flush json: {}", path.display()))?;

    tracing::info!(path = %path.display(), records = books.len(), "saved json");
    Ok(())
}

pub fn read_csv(path: &Path) -> anyhow::Result<Vec<BookRecord>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read csv: {}", path.display()))?;
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);

    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    reader
        .deserialize::<BookRecord>()
        .map(|row| row.with_context(|| format!("parse csv record: {}", path.display())))
        .collect()
}

pub fn read_json(path: &Path) -> anyhow::Result<Vec<BookRecord>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read json: {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse json: {}", path.display()))
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    Ok(())
}

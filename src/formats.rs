use serde::{Deserialize, Serialize};

pub const RATING_NOT_AVAILABLE: &str = "Not available";

/// Column order shared by the CSV header and the JSON object fields.
pub const BOOK_FIELDS: [&str; 6] = [
    "title",
    "price",
    "rating",
    "availability",
    "cover_url",
    "cover_interpretation",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub price: String,
    pub rating: String,
    pub availability: String,
    pub cover_url: String,
    #[serde(default)]
    pub cover_interpretation: String,
}

impl BookRecord {
    pub fn has_sentinel_rating(&self) -> bool {
        self.rating.trim() == RATING_NOT_AVAILABLE
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub markdown: String,
    pub html: String,
}

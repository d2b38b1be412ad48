#![forbid(unsafe_code)]

pub mod caption;
pub mod cli;
pub mod crawl;
pub mod export;
pub mod extract;
pub mod formats;
pub mod logging;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod rating;

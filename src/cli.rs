use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Run(RunArgs),
    Parse(ParseArgs),
    Rating(RatingArgs),
    Prompt(PromptArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaptionEngine {
    Noop,
    Hf,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Catalogue root; page N >= 2 is `{base}catalogue/page-N.html`.
    #[arg(long, default_value = "https://books.toscrape.com/")]
    pub base_url: String,

    /// Number of catalogue pages to process.
    #[arg(long, default_value_t = 2)]
    pub pages: usize,

    /// Output CSV path.
    #[arg(long, default_value = "output/books.csv")]
    pub csv: String,

    /// Output JSON path.
    #[arg(long, default_value = "output/books.json")]
    pub json: String,

    /// OpenAI-compatible base URL (chat completions).
    #[arg(long, default_value = "https://router.huggingface.co/v1")]
    pub llm_base_url: String,

    /// Chat model id.
    #[arg(long, default_value = "meta-llama/Llama-3.3-70B-Instruct")]
    pub llm_model: String,

    /// Maximum tokens in the completion.
    #[arg(long, default_value_t = 500)]
    pub llm_max_tokens: u32,

    /// Request timeout for completion calls, in seconds.
    #[arg(long, default_value_t = 120)]
    pub llm_timeout_secs: u64,

    /// Cover captioning engine.
    #[arg(long, value_enum, default_value_t = CaptionEngine::Hf)]
    pub caption_engine: CaptionEngine,

    /// Inference base URL; the model id is appended as a path.
    #[arg(long, default_value = "https://router.huggingface.co/hf-inference/models")]
    pub caption_base_url: String,

    /// Captioning model id (appended to --caption-base-url).
    #[arg(long, default_value = "nlpconnect/vit-gpt2-image-captioning")]
    pub caption_model: String,

    /// Request timeout for image download and captioning, in seconds.
    #[arg(long, default_value_t = 60)]
    pub caption_timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Saved model output to parse.
    #[arg(long)]
    pub input: String,

    /// Write records as JSON here instead of stdout.
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Debug, Args)]
pub struct RatingArgs {
    /// Saved catalogue page markup.
    #[arg(long)]
    pub html: String,

    /// Book title, as the listing's link title.
    #[arg(long)]
    pub title: String,
}

#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Page content (Markdown) to embed in the prompt.
    #[arg(long)]
    pub input: String,
}

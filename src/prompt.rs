use anyhow::Context as _;

use crate::cli::PromptArgs;

pub fn run(args: PromptArgs) -> anyhow::Result<()> {
    let markdown = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read page markdown: {}", &args.input))?;
    print!("{}", extraction_prompt(&markdown));
    Ok(())
}

pub fn extraction_prompt(page_markdown: &str) -> String {
    format!(
        "TASK: Extract a list of books from the webpage content below. \
For each book, output a bullet point in the following markdown format:\n\
\n\
- Title: <book title>\n  \
Price: <price>\n  \
Rating: <rating>\n  \
Availability: <availability>\n  \
Cover: <cover image URL>\n\
\n\
Make sure to include only the books found in the main content of the page.\n\
\n\
CONTENT:\n\
{page_markdown}\n"
    )
}

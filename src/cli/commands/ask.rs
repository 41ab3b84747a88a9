use anyhow::{Context, Result};
use clap::Args;

use crate::app::prepare_backend;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(
        required = true,
        help = "Questions to ask, in order; later ones can refer to earlier answers"
    )]
    pub questions: Vec<String>,
}

pub async fn handle_ask(
    args: AskArgs,
    config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);

    let questions: Vec<&str> = args
        .questions
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .collect();
    if questions.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let backend = prepare_backend(&config, format == OutputFormat::Text).await?;
    let mut session = backend.conversation(&config);

    for question in questions {
        if verbose {
            eprintln!("Question: \"{question}\"");
        }
        session
            .ask(question)
            .await
            .with_context(|| format!("failed to answer: {question}"))?;
    }

    print!("{}", formatter.format_transcript(session.history()));
    Ok(())
}

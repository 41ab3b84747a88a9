use anyhow::Result;
use clap::Args;

use crate::app::prepare_backend;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{PdfExtractor, prepare_chunks};

#[derive(Debug, Args)]
pub struct IndexArgs {
    #[arg(long, help = "Also embed the chunks (calls the embedding API)")]
    pub embed: bool,
}

pub async fn handle_index(
    args: IndexArgs,
    config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Documents: {}", config.documents.docs_dir.display());
        eprintln!(
            "  Chunk size: {}, overlap: {}",
            config.chunking.chunk_size, config.chunking.chunk_overlap
        );
    }

    let stats = if args.embed {
        prepare_backend(&config, format == OutputFormat::Text)
            .await?
            .stats
    } else {
        let (_, stats) = prepare_chunks(
            &config.documents.docs_dir,
            &config.chunking,
            &PdfExtractor,
        )?;
        stats
    };

    print!("{}", formatter.format_index_stats(&stats));
    Ok(())
}

//! Summa PDF CLI - PDF summarisation with local or cloud LLMs
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use summa_pdf::summarizer::DEFAULT_TEMPERATURE;
use summa_pdf::{
    console, logging, server, Config, PageRange, ProviderKind, Summarizer, SummaryRequest,
};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser)]
#[command(name = "summa-pdf")]
#[command(author, version, about = "Summarise PDF documents with local or cloud LLMs", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console flow (the default)
    Console,
    /// Run the HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Summarise a PDF without prompting
    Summarise {
        /// PDF file to summarise
        pdf: PathBuf,
        /// LLM provider: ollama or openai
        #[arg(short, long, value_parser = console::parse_provider_choice)]
        provider: ProviderKind,
        /// Model name (defaults per provider)
        #[arg(short, long)]
        model: Option<String>,
        /// Sampling temperature
        #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,
        /// API key (falls back to OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
        /// First page to include, zero-based
        #[arg(long)]
        start_page: Option<usize>,
        /// Page to stop before, zero-based
        #[arg(long)]
        end_page: Option<usize>,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "summa-pdf", &mut std::io::stdout());
        }
        Commands::Serve { host, port } => {
            let (config, _log_guard) = load_config(verbose, true)?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            server::serve(Summarizer::new(config), &host, port).await?;
        }
        Commands::Summarise {
            pdf,
            provider,
            model,
            temperature,
            max_tokens,
            api_key,
            start_page,
            end_page,
            json,
        } => {
            let (mut config, log_guard) = load_config(verbose, false)?;
            if start_page.is_some() || end_page.is_some() {
                config.extractor.page_range = Some(PageRange::new(
                    start_page.unwrap_or(0),
                    end_page.unwrap_or(usize::MAX),
                ));
            }

            let api_key = api_key.or_else(|| config.openai.api_key.clone());
            let model = model.unwrap_or_else(|| provider.default_model().to_string());
            let request = SummaryRequest::new(pdf, provider.as_str(), model)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens)
                .with_api_key(api_key);

            let summarizer = Summarizer::new(config);
            match summarizer.summarize(&request).await {
                Ok(response) if json => println!("{}", serde_json::to_string_pretty(&response)?),
                Ok(response) => println!("{}", console::render_summary(&response)),
                Err(e) => {
                    eprintln!("{}", console::render_error(&e));
                    drop(log_guard);
                    std::process::exit(1);
                }
            }
        }
        Commands::Console => {
            let (config, log_guard) = load_config(verbose, false)?;
            let summarizer = Summarizer::new(config);
            if console::run(&summarizer).await?.is_none() {
                drop(log_guard);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Load configuration and install logging for a run mode
fn load_config(verbose: bool, serving: bool) -> anyhow::Result<(Config, Option<WorkerGuard>)> {
    let config = Config::load()?;
    let guard = logging::init(
        logging::default_filter(verbose, serving),
        config.logging.dir.as_deref(),
    );
    tracing::info!("Starting summa-pdf");
    Ok((config, guard))
}

//! CLI entry point for the Aisle retrieval core (for dev and testing).

use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;

use aisle_core::{
    app_data_dir, load_config, set_indices_dir, shared, status, Config, Embedder, IndexStore,
    ProductQuery,
};
use clap::Parser;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "aisle")]
#[command(about = "Aisle: FAQ and product retrieval for the shopping assistant")]
struct Cli {
    /// Directory holding faq.index, products.index and their metadata (overrides config).
    #[arg(long, global = true, env = "AISLE_INDICES_DIR", value_name = "PATH")]
    indices_dir: Option<PathBuf>,
    /// Ollama server used for query embeddings (overrides config).
    #[arg(long, global = true, env = "AISLE_OLLAMA_URL", value_name = "URL")]
    ollama_url: Option<String>,
    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status and what the loaded indices contain.
    Status,
    /// Show where Aisle stores its config and indices (app data directory).
    DataDir,
    /// Print the effective config.
    Config,
    /// Remember the directory holding the pre-built indices.
    SetIndicesDir {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Embed a probe text and check the model dimension against both indices.
    Check,
    /// Search the FAQ.
    Faq {
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Search the product catalog, optionally filtered.
    Products {
        #[arg(value_name = "QUERY")]
        query: Option<String>,
        #[arg(long)]
        article_type: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        base_colour: Option<String>,
        #[arg(long)]
        usage: Option<String>,
        #[arg(long)]
        season: Option<String>,
        /// Number of results.
        #[arg(short)]
        k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = load_config();
    if let Some(dir) = &cli.indices_dir {
        config.indices_dir = Some(dir.to_string_lossy().into_owned());
    }
    if let Some(url) = &cli.ollama_url {
        config.ollama_url = Some(url.clone());
    }

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            println!("Aisle backend");
            println!("  core: {}", status());
            match config.indices_dir() {
                Some(dir) => println!("  indices: {}", dir.display()),
                None => println!("  indices: (unknown)"),
            }
            match open(&config) {
                Ok(store) => {
                    let summary = store.describe();
                    println!("  model: {}", summary.model);
                    println!(
                        "  faq: {} vectors, {} dimensions",
                        summary.faq_vectors, summary.faq_dimension
                    );
                    println!(
                        "  products: {} vectors, {} dimensions",
                        summary.product_vectors, summary.product_dimension
                    );
                    ExitCode::SUCCESS
                }
                Err(code) => code,
            }
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => {
                println!("{}", p.display());
                ExitCode::SUCCESS
            }
            None => fail("Could not determine app data directory."),
        },
        Commands::Config => print_json(&config),
        Commands::SetIndicesDir { path } => match set_indices_dir(&path) {
            Ok(()) => {
                println!("Indices directory set to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        },
        Commands::Check => {
            let store = match open(&config) {
                Ok(store) => store,
                Err(code) => return code,
            };
            match store.check_embedder().await {
                Ok(dimension) => {
                    println!(
                        "Model {} produces {}-dimensional vectors; both indices match.",
                        store.embedder().model_name(),
                        dimension
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => fail(e),
            }
        }
        Commands::Faq { query } => {
            let store = match open(&config) {
                Ok(store) => store,
                Err(code) => return code,
            };
            match store.search_faq(&query).await {
                Ok(hits) => print_json(&hits),
                Err(e) => fail(e),
            }
        }
        Commands::Products {
            query,
            article_type,
            gender,
            base_colour,
            usage,
            season,
            k,
        } => {
            let store = match open(&config) {
                Ok(store) => store,
                Err(code) => return code,
            };
            let request = ProductQuery {
                query,
                article_type,
                gender,
                base_colour,
                usage,
                season,
                k,
            };
            match store.search_products(&request).await {
                Ok(response) => print_json(&response),
                Err(e) => fail(e),
            }
        }
    }
}

fn open(config: &Config) -> Result<&'static IndexStore, ExitCode> {
    shared(config).map_err(fail)
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fail(e: impl Display) -> ExitCode {
    eprintln!("Error: {}", e);
    ExitCode::FAILURE
}

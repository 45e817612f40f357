use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use codecontext::cli::DEFAULT_WINDOW_LINES;
use codecontext::{Commands, Container, ContainerConfig, Router, StrategyArg};

#[derive(Parser)]
#[command(name = "codecontext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, default_value = "~/.codecontext")]
    data_dir: String,

    #[arg(long, global = true)]
    mock_embeddings: bool,

    #[arg(long, global = true)]
    memory_storage: bool,

    #[arg(long, global = true, value_enum, default_value = "fixed")]
    strategy: StrategyArg,

    #[arg(long, global = true, default_value_t = DEFAULT_WINDOW_LINES)]
    window_lines: usize,

    /// Chunk files containing syntax errors instead of skipping them
    #[arg(long, global = true)]
    lenient_parse: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_tilde(&cli.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let container = Container::new(ContainerConfig {
        data_dir,
        mock_embeddings: cli.mock_embeddings,
        memory_storage: cli.memory_storage,
        strategy: cli.strategy.into_strategy(cli.window_lines),
        lenient_parse: cli.lenient_parse,
    })
    .await?;

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use lease_scout::browser::ChromeSessionProvider;
use lease_scout::{NamingMode, ScoutConfig, ScraperRegistry, ScrapingRunner};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lease-scout", about = "Collect apartment availability from building websites")]
struct Args {
    /// Show the browser window
    #[arg(long)]
    debug: bool,

    /// Where result files go [default: results, or LEASE_SCOUT_OUTPUT_DIR]
    #[arg(long)]
    output_dir: Option<String>,

    /// Only run these scrapers
    #[arg(long, num_args = 1..)]
    scrapers: Option<Vec<String>>,

    /// Print the registered scrapers and exit
    #[arg(long)]
    list_scrapers: bool,

    /// Log unit counts instead of writing a results file
    #[arg(long)]
    no_save: bool,

    /// Use daily-results_ file names
    #[arg(long)]
    daily: bool,

    /// Include scrapers that are disabled by default
    #[arg(long)]
    all_known: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let code = exit_code(run(args), tokio::signal::ctrl_c()).await;
    if code != 0 {
        std::process::exit(code);
    }
}

/// Race the run against an interrupt. The losing future is dropped before
/// this returns, so the browser session closes before the process exits.
async fn exit_code<R, I>(run: R, interrupt: I) -> i32
where
    R: Future<Output = Result<()>>,
    I: Future,
{
    tokio::select! {
        outcome = run => match outcome {
            Ok(()) => 0,
            Err(e) => {
                error!("Error: {:#}", e);
                1
            }
        },
        _ = interrupt => {
            info!("Interrupted");
            1
        }
    }
}

/// Flags only override settings they were given for
fn build_config(args: &Args, base: ScoutConfig) -> ScoutConfig {
    let mut config = base;
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    if args.debug {
        config = config.with_headless(false);
    }
    if args.daily {
        config = config.with_naming(NamingMode::Daily);
    }
    config
}

async fn run(args: Args) -> Result<()> {
    let config = build_config(&args, ScoutConfig::from_env());

    let registry = if args.all_known {
        ScraperRegistry::with_all_known()?
    } else {
        ScraperRegistry::new()
    };

    if args.list_scrapers {
        for name in registry.list_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let provider = Arc::new(ChromeSessionProvider::from_config(&config));
    let runner = ScrapingRunner::new(registry, provider, &config);
    let names = args.scrapers.as_deref();

    if args.no_save {
        runner.run(names).await?;
    } else {
        let (results, path) = runner.run_and_save(names).await?;
        let total: usize = results.values().map(Vec::len).sum();
        info!("Saved {} units from {} scrapers to {}", total, results.len(), path.display());
    }

    Ok(())
}

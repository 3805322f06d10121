mod commands;
mod observer;
mod setup;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "monocyte")]
#[command(
    about = "Search and destroy AWS resources living outside the allowed regions",
    long_about = None
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that needs the region policy
#[derive(Args, Debug, Default)]
pub struct PolicyArgs {
    /// Configuration file (default: discovered, see MONOCYTE_CONFIG_PATH)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Allowed region prefix; replaces the configured list when given
    #[arg(long = "allow-prefix", value_name = "PREFIX")]
    pub allow_prefixes: Vec<String>,

    /// Region that is never enumerated; replaces the configured list when given
    #[arg(long = "ignore-region", value_name = "REGION")]
    pub ignore_regions: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sweep (dry run unless --execute)
    Sweep {
        #[command(flatten)]
        policy: PolicyArgs,
        /// Really delete resources (subject to the per-handler circuit breakers)
        #[arg(long)]
        execute: bool,
        /// Only sweep this service (repeatable)
        #[arg(short = 'n', long = "service", value_name = "NAME")]
        services: Vec<String>,
        /// Region used to bootstrap the AWS clients
        #[arg(short, long, env = "AWS_REGION")]
        region: Option<String>,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the registered handlers
    Handlers {
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Show how the region policy treats the given regions
    CheckRegion {
        #[command(flatten)]
        policy: PolicyArgs,
        /// Region names to check
        #[arg(required = true)]
        regions: Vec<String>,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Sweep {
            policy,
            execute,
            services,
            region,
            json,
        } => {
            let success = commands::sweep::handle(commands::sweep::SweepOptions {
                policy,
                execute,
                services,
                region,
                json,
            })
            .await?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::Handlers { policy } => {
            commands::handlers::handle(&policy).await?;
        }
        Commands::CheckRegion { policy, regions } => {
            commands::check_region::handle(&policy, &regions)?;
        }
        Commands::Version => {
            println!("monocyte {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

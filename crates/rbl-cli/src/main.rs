use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rbl")]
#[command(about = "Weighted rebalance allocation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Allocate each account's target across its holdings
    Allocate {
        /// Layered config paths in merge order; defaults apply when omitted
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Accounts YAML file
        #[arg(long)]
        accounts: String,

        /// Treat unread config keys as an error instead of a warning
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = rbl_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Allocate {
            config_paths,
            accounts,
            strict_config,
        } => {
            let config = commands::load_rebalance_config(&config_paths, strict_config)?;
            let summary = commands::allocate::run(&config, &accounts)?;
            if summary.problems > 0 {
                bail!(
                    "{} of {} account(s) could not be fully rebalanced",
                    summary.problems,
                    summary.accounts
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

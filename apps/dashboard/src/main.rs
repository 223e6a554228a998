use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use realtime_sync::SyncClient;
use secure_store::{FileStorage, LocalStore, UserDataStore};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use solsniperx_dashboard::{run_watch, ApiClient, AppConfig, Metrics};

#[derive(Parser, Debug)]
#[command(name = "solsniperx")]
#[command(about = "SolSniperX terminal dashboard", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream prices and events for the watchlist until Ctrl-C
    Watch,
    /// Store credentials locally
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        private_key: String,
        /// Backend auth token sent as a bearer token
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the stored credentials
    Logout,
    /// Print the stored session
    Session,
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
    /// Write a decoded backup of all stored data
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore a backup written by `export`
    Import { file: PathBuf },
    /// Run the token scanner
    Scan {
        /// Scanner parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// AI analysis of a token
    Analyze { token: String },
    Buy {
        token: String,
        amount_sol: f64,
        #[arg(long)]
        slippage: Option<f64>,
    },
    Sell {
        token: String,
        amount_tokens: f64,
        #[arg(long)]
        slippage: Option<f64>,
    },
    /// Wallet balance reported by the backend
    Balance,
}

#[derive(Subcommand, Debug)]
enum WatchlistAction {
    Add { token: String },
    Remove { token: String },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let storage = FileStorage::open(config.storage_path())
        .with_context(|| format!("Failed to open {}", config.storage_path().display()))?;
    let data = UserDataStore::new(LocalStore::with_prefix(storage, config.storage_prefix.clone()));

    match args.command {
        Command::Watch => watch(&config, &data).await,
        Command::Login {
            username,
            private_key,
            token,
        } => {
            let mut ok = data.save_user(&json!({ "username": &username }));
            ok &= data.save_private_key(&private_key);
            if let Some(token) = token {
                ok &= data.save_auth_token(&token);
            }
            anyhow::ensure!(ok, "Failed to store credentials");
            info!("🔐 Logged in as {}", username);
            Ok(())
        }
        Command::Logout => {
            anyhow::ensure!(data.logout(), "Failed to clear credentials");
            info!("👋 Logged out");
            Ok(())
        }
        Command::Session => print_json(&serde_json::to_value(data.session())?),
        Command::Watchlist { action } => match action {
            WatchlistAction::Add { token } => {
                anyhow::ensure!(data.add_to_watchlist(&token), "Failed to update watchlist");
                Ok(())
            }
            WatchlistAction::Remove { token } => {
                anyhow::ensure!(data.remove_from_watchlist(&token), "Failed to update watchlist");
                Ok(())
            }
            WatchlistAction::List => {
                for token in data.get_watchlist() {
                    println!("{}", token);
                }
                Ok(())
            }
        },
        Command::Export { out } => {
            let backup = serde_json::to_string_pretty(&data.store().export_data())?;
            match out {
                Some(path) => {
                    fs::write(&path, backup)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("💾 Exported to {}", path.display());
                }
                None => println!("{}", backup),
            }
            Ok(())
        }
        Command::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let backup: Map<String, Value> =
                serde_json::from_str(&raw).context("Backup is not a JSON object")?;
            anyhow::ensure!(data.store().import_data(&backup), "Import incomplete");
            info!("📥 Imported {} entries", backup.len());
            Ok(())
        }
        command => {
            let api = ApiClient::new(&config.api_url, config.http_timeout)?
                .with_token(data.get_auth_token());
            let response = match command {
                Command::Scan { params } => {
                    let params: Value =
                        serde_json::from_str(&params).context("Invalid --params JSON")?;
                    api.scan_tokens(&params).await?
                }
                Command::Analyze { token } => api.analyze_token(&token).await?,
                Command::Buy {
                    token,
                    amount_sol,
                    slippage,
                } => api.buy_token(&token, amount_sol, slippage).await?,
                Command::Sell {
                    token,
                    amount_tokens,
                    slippage,
                } => api.sell_token(&token, amount_tokens, slippage).await?,
                Command::Balance => api.wallet_balance().await?,
                other => anyhow::bail!("{:?} is not a backend command", other),
            };
            print_json(&response)
        }
    }
}

async fn watch(config: &AppConfig, data: &UserDataStore<FileStorage>) -> Result<()> {
    let watchlist = data.get_watchlist();
    if watchlist.is_empty() {
        warn!("Watchlist is empty; only broadcast events will be shown");
    }

    let metrics = Metrics::new()?;
    let client = SyncClient::websocket(config.realtime.clone());
    info!("🚀 Connecting to {}", config.realtime.url);

    let result = run_watch(&client, &watchlist, &metrics, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;

    client.shutdown().await;
    info!("📊 Session metrics:\n{}", metrics.export());
    result
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_logic::{setup_logger, ProxyConfig, ProxyManager, TokenManager, Worker, WorkerRunner};
use dotenv::dotenv;
use futures::future::join_all;
use nu_ansi_term::Color;
use std::sync::Arc;
use tonton_tapper::{TapperConfig, TapperWorker};
use tracing::{error, info, Instrument};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.json")]
    config: String,
    #[arg(short, long, default_value = "token.txt")]
    tokens: String,
    #[arg(short, long, default_value = "proxy.txt")]
    proxies: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the tap loop for every account (default)
    Run,
    /// Print the active multiplier quest ids of every account and exit
    Quests,
}

fn print_banner() {
    let title = Color::Cyan.bold().paint("TonTon Tapper");
    let line = Color::DarkGray.paint("=".repeat(40));
    println!("{}\n  {}\n  {}\n{}", line, title, Color::Yellow.paint("multi-account auto tapper"), line);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // Keep guard alive for file logging
    let _log_guard = setup_logger();

    let args = Args::parse();
    print_banner();

    info!("Loading config from: {}", args.config);
    let config = TapperConfig::from_path(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config))?;
    let config = Arc::new(config);

    let tokens = TokenManager::load(&args.tokens)
        .with_context(|| format!("failed to load tokens from {}", args.tokens))?;
    info!("Loaded {} accounts.", tokens.count());

    let proxies = if config.use_proxy {
        let proxies = ProxyManager::load_proxies(&args.proxies)?;
        info!("Loaded {} proxies.", proxies.len());
        proxies
    } else {
        Vec::new()
    };

    let workers: Vec<TapperWorker> = tokens
        .into_tokens()
        .into_iter()
        .enumerate()
        .map(|(i, token)| {
            let proxy: Option<ProxyConfig> = ProxyManager::proxy_for(&proxies, i);
            TapperWorker::new(i + 1, token, proxy, config.clone())
        })
        .collect();

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            let workers: Vec<Box<dyn Worker>> = workers
                .into_iter()
                .map(|w| Box::new(w) as Box<dyn Worker>)
                .collect();
            WorkerRunner::run_workers(workers).await?;
        }
        Command::Quests => list_quests(workers).await,
    }

    Ok(())
}

async fn list_quests(workers: Vec<TapperWorker>) {
    let lookups = workers.into_iter().map(|mut worker| {
        let index = worker.session().index;
        let span = tracing::info_span!("account", account = %format!("{:03}", index));
        async move {
            let api = match worker.connect().await {
                Ok(api) => api,
                Err(e) => {
                    error!("Setup failed: {:#}", e);
                    return;
                }
            };
            match api.fetch_quest_ids().await {
                Ok(ids) if ids.is_empty() => info!("No active multiplier quests."),
                Ok(ids) => info!("Active multiplier quests: {}", ids.join(", ")),
                Err(e) => error!("Failed to fetch quests: {}", e),
            }
        }
        .instrument(span)
    });

    join_all(lookups).await;
}

//! Portfolio server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI
//!   3. Load config
//!   4. Init logger (CLI `--log-level` > RUST_LOG > config; `--log-file` > config)
//!   5. Open the document store
//!   6. Load the blog catalog
//!   7. Build the news client and email provider
//!   8. Spawn Ctrl-C → shutdown watcher
//!   9. Start cron + job worker, schedule the news timers
//!  10. Serve HTTP until shutdown

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use portfolio_server::blog::BlogCatalog;
use portfolio_server::error::AppError;
use portfolio_server::news::NewsClient;
use portfolio_server::state::AppState;
use portfolio_server::store::Store;
use portfolio_server::{config, cron, http, jobs, logger, mail};

struct CliArgs {
    config_path: Option<String>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Optional file.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();
    if let Some(level) = args.log_level.as_deref() {
        logger::parse_level(level)?;
    }

    let config = config::load(args.config_path.as_deref())?;

    let log = logger::LogSettings::resolve(&config, args.log_level.as_deref(), args.log_file.as_deref());
    logger::init(log)?;

    info!(
        name = %config.name,
        work_dir = %config.work_dir.display(),
        bind = %config.server.bind,
        configured_log_level = %config.log_level,
        effective_log_level = %log.level,
        log_file = ?log.file,
        secrets = ?config.secrets,
        "config loaded"
    );

    let store = Store::open(&config.work_dir)?;
    let blog = BlogCatalog::load(&config.blog.data_path, config.blog.page_size)?;

    let news_client = NewsClient::new(&config.news, config.secrets.news_api_key.clone())?;
    if !news_client.has_key() {
        warn!("NEWS_API_KEY not set; news refresh is disabled until it is provided");
    }
    let mailer = mail::providers::from_config(&config)?;
    info!(provider = mailer.name(), "email provider ready");

    let shutdown = CancellationToken::new();

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received; initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let (job_tx, job_rx) = mpsc::channel(8);
    let cron = cron::spawn(job_tx, shutdown.clone());

    let state = AppState::new(&config, store, blog, news_client, mailer, cron.clone());

    let worker = tokio::spawn(jobs::run_worker(state.clone(), job_rx, shutdown.clone()));
    jobs::schedule_defaults(&cron, config.news.refresh_every_secs, config.news.cleanup_every_secs).await?;

    let served = http::serve(state, &config.server.bind, shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = worker.await {
        warn!(error = %e, "job worker task failed");
    }
    info!("shutdown complete");
    served
}

fn parse_cli_args() -> CliArgs {
    let mut args = CliArgs { config_path: None, log_level: None, log_file: None };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: portfolio-server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -l, --log-level <LEVEL>    Override the configured log level");
                println!("      --log-file <PATH>      Append logs to a file instead of stderr");
                std::process::exit(0);
            }
            "-f" | "--config" => args.config_path = Some(required_value(&mut iter, "-f/--config")),
            "-l" | "--log-level" => args.log_level = Some(required_value(&mut iter, "-l/--log-level")),
            "--log-file" => args.log_file = Some(PathBuf::from(required_value(&mut iter, "--log-file"))),
            other => eprintln!("warning: ignoring unknown argument '{other}'"),
        }
    }

    args
}

fn required_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match iter.next() {
        Some(v) => v,
        None => {
            eprintln!("error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}

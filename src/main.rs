use clap::Parser;
use seek_page::config::AppConfig;
use seek_page::session::{render, usage};
use seek_page::{SearchRequest, build_walker};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::Search { url, word, json } => run_search(&config, &url, &word, json).await,
        Command::Telegram => {
            let walker = match build_walker(&config.search) {
                Ok(walker) => walker,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            match seek_page::telegram::run(&config.bot, walker).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    ::log::error!("Telegram bot stopped: {}", e);
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Reads the configuration file, if any, and applies command-line overrides
fn load_config(args: &Args) -> Result<AppConfig, seek_page::config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(timeout) = args.timeout {
        config.search.request_timeout_secs = timeout;
    }
    if let Some(max_pages) = args.max_pages {
        config.search.max_pages = max_pages;
    }

    ::log::debug!("Effective configuration: {:?}", config.search);
    Ok(config)
}

/// One-shot search from the command line; Ctrl-C stops it between pages
async fn run_search(config: &AppConfig, url: &str, word: &str, json: bool) -> ExitCode {
    let request = match SearchRequest::new(url, word) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", usage(&e));
            return ExitCode::FAILURE;
        }
    };

    let walker = match build_walker(&config.search) {
        Ok(walker) => walker,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::info!("Interrupted, stopping after the current page");
            ctrl_c.cancel();
        }
    });

    let start_time = std::time::Instant::now();
    let result = walker.search_with_cancel(&request, &cancel).await;
    ::log::info!(
        "Search finished in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", render(request.search_term(), &result));
    }

    if result.is_found() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

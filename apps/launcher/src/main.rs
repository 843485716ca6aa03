use std::{collections::BTreeMap, io, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use launcher_core::{
    parse_query_params, AuthAppLauncher, ChannelLinkSource, LaunchOptions, LaunchOutcome,
    LaunchSettings,
};
use serde::Serialize;
use shared::domain::ClientId;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

#[derive(Parser, Debug)]
#[command(name = "auth-launch", about = "Open the Chainless auth app or offer to install it")]
struct Args {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the auth app to sign in for a client.
    Launch {
        #[arg(long)]
        client_id: String,
        /// Backend for the pre-flight client check; overrides the config.
        #[arg(long)]
        validate_with: Option<String>,
    },
    /// Print the query parameters of a URL as JSON.
    Parse { url: String },
    /// Treat each stdin line as an inbound deep link and print it as JSON.
    Listen {
        #[arg(long, default_value = "auth-launch")]
        client_id: String,
        /// URL the process was "launched with".
        #[arg(long)]
        initial_url: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct DeepLinkRecord {
    url: String,
    params: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config);

    match args.command {
        Command::Launch {
            client_id,
            validate_with,
        } => {
            if validate_with.is_some() {
                settings.validation_base_url = validate_with;
            }
            run_launch(settings, &client_id).await
        }
        Command::Parse { url } => {
            let params: BTreeMap<_, _> = parse_query_params(&url).into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
        Command::Listen {
            client_id,
            initial_url,
        } => run_listen(settings, &client_id, initial_url).await,
    }
}

async fn run_launch(settings: LaunchSettings, client_id: &str) -> Result<()> {
    let client_id = ClientId::new(client_id).context("invalid --client-id")?;
    let launcher = AuthAppLauncher::new(
        LaunchOptions::new(client_id),
        settings,
        Arc::new(ChannelLinkSource::new()),
    )
    .context("failed to set up launcher")?;

    let outcome = launcher.launch().await;
    println!("{}", serde_json::to_string(&outcome.result())?);

    if let Some(element) = launcher.render_dialog() {
        let mut input = BufReader::new(tokio::io::stdin());
        let choice = terminal::prompt(&element, &mut io::stdout(), &mut input)
            .await
            .context("failed to read dialog answer")?;
        debug!(?choice, "launcher: dialog answered");
        terminal::apply(&element, choice);
        launcher
            .watch_dialog()
            .wait_for(|visible| !*visible)
            .await
            .context("dialog state closed")?;
    }

    match outcome {
        LaunchOutcome::Rejected { .. } | LaunchOutcome::Unavailable { .. } => {
            bail!("launch failed: {}", outcome.message())
        }
        LaunchOutcome::Opened | LaunchOutcome::AppMissing { .. } => Ok(()),
    }
}

async fn run_listen(
    settings: LaunchSettings,
    client_id: &str,
    initial_url: Option<String>,
) -> Result<()> {
    let client_id = ClientId::new(client_id).context("invalid --client-id")?;
    let mut pending = usize::from(initial_url.is_some());
    let links = Arc::new(match initial_url {
        Some(url) => ChannelLinkSource::with_initial_url(url),
        None => ChannelLinkSource::new(),
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = LaunchOptions::new(client_id).on_deep_link(move |url, params| {
        let _ = tx.send(DeepLinkRecord {
            url: url.to_string(),
            params: params.clone().into_iter().collect(),
        });
    });
    let mut launcher = AuthAppLauncher::new(options, settings, links.clone())
        .context("failed to set up launcher")?;
    info!("deeplink: listening on stdin, one url per line");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let url = line.trim();
                if !url.is_empty() {
                    pending += links.deliver(url).min(1);
                }
            }
            Some(record) = rx.recv() => {
                print_record(&record)?;
                pending = pending.saturating_sub(1);
            }
        }
    }

    while pending > 0 {
        let Some(record) = rx.recv().await else {
            break;
        };
        print_record(&record)?;
        pending -= 1;
    }

    launcher.shutdown().await;
    Ok(())
}

fn print_record(record: &DeepLinkRecord) -> Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

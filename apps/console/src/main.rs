use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use session_core::{
    load_settings, MissingClientLibrary, MissingPaymentBackend, Session, SessionError,
    UiSignal,
};
use shared::domain::{UserId, ID_LEN};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// TOML settings file; environment overrides still apply.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "me")]
    nick: String,
    /// Stay offline on the first server connection after a wallet restore.
    #[arg(long)]
    restore: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    settings.is_restore |= args.restore;

    let (signals_tx, mut signals) = mpsc::unbounded_channel::<UiSignal>();
    let client = Arc::new(MissingClientLibrary {
        local_id: UserId([0; ID_LEN]),
        local_nick: args.nick,
    });
    let session = Session::new(
        settings,
        client,
        Arc::new(MissingPaymentBackend),
        Arc::new(signals_tx),
    )?;
    session.start();

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("console: interrupted");
                break;
            }
            line = input.next_line() => match line? {
                Some(line) => {
                    if !run_command(&session, line.trim()).await {
                        break;
                    }
                }
                None => break,
            },
            Some(signal) = signals.recv() => match signal {
                UiSignal::RepaintActive => printed = print_diag(&session, printed),
                UiSignal::FooterChanged
                | UiSignal::ActiveWindowChanged
                | UiSignal::ConnectionChanged(_)
                | UiSignal::OutboundQueueChanged(_) => println!("{}", session.footer_view()),
                UiSignal::Bell { from } => println!("\x07* {from}"),
                other => debug!(?other, "console: signal"),
            },
        }
    }

    session.shutdown().await;
    Ok(())
}

async fn run_command(session: &Arc<Session>, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("/quit"), _) => return false,
        (Some("/skipwalletcheck"), _) => session.skip_next_wallet_check(),
        (Some("/win"), Some(index)) => match index.parse::<i64>() {
            Ok(index) => {
                if let Err(err) = session.change_active_window_index(index) {
                    report(session, err);
                }
            }
            Err(_) => session.window_help_msg(format!("Invalid window {index:?}")),
        },
        (Some("/msg"), Some(name)) => {
            if let Err(err) = session.open_chat_window(name).await {
                report(session, err);
            }
        }
        (Some("/close"), _) => {
            if let Err(err) = session.close_active_window() {
                report(session, err);
            }
        }
        (None, _) => {}
        (Some(cmd), _) => warn!(%cmd, "console: unknown command"),
    }
    true
}

fn report(session: &Session, err: SessionError) {
    if err.kind().is_fatal() {
        error!(error = %err, "console: command failed");
    } else {
        debug!(kind = ?err.kind(), error = %err, "console: command failed");
    }
    session.window_help_msg(err.to_string());
}

fn print_diag(session: &Session, printed: usize) -> usize {
    let lines = session.diag_messages();
    for line in lines.iter().skip(printed) {
        println!("{line}");
    }
    lines.len()
}

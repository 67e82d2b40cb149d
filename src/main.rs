mod api;
mod cascade;
mod catalog;
mod config;
mod dashboard;
mod drafts;
mod ipc;
mod models;
mod notify;
mod preview;
mod purchases;
mod submit;
mod validate;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::HttpBackend;
use crate::config::AdminConfig;

enum Event {
    Line(std::io::Result<Option<String>>),
    Tick,
}

fn init_tracing() {
    // stdout carries the protocol, so logs go to stderr.
    let filter = std::env::var("EDUADMIN_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("eduadmind=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(serve())
}

/// Resolves on the next refresh tick, or never while nothing is watched.
async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn sync_ticker(ticker: &mut Option<Interval>, watching: bool, period: Duration) {
    match (watching, ticker.is_some()) {
        (true, false) => {
            let mut t = tokio::time::interval_at(Instant::now() + period, period);
            t.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(t);
        }
        (false, true) => *ticker = None,
        _ => {}
    }
}

async fn write_line(stdout: &mut Stdout, resp: &Value) -> anyhow::Result<()> {
    let mut out = serde_json::to_string(resp).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    out.push('\n');
    stdout.write_all(out.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let cfg = AdminConfig::from_env();
    info!(api_url = %cfg.api_url, "eduadmind starting");
    let period = cfg.dashboard_refresh;
    let backend = Arc::new(HttpBackend::new(cfg.clone())?);
    let mut state = ipc::AppState::new(cfg, backend);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut ticker: Option<Interval> = None;

    loop {
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line),
            _ = tick(&mut ticker) => Event::Tick,
        };

        let line = match event {
            Event::Tick => {
                ipc::dashboard_tick(&mut state).await;
                continue;
            }
            Event::Line(Ok(Some(v))) => v,
            Event::Line(Ok(None)) => break,
            Event::Line(Err(e)) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req).await,
            // No id to echo back.
            Err(e) => ipc::err("", "bad_json", e.to_string(), None),
        };
        if let Err(e) = write_line(&mut stdout, &resp).await {
            warn!(error = %format!("{e:#}"), "stdout closed");
            break;
        }
        sync_ticker(&mut ticker, state.dashboard.watching(), period);
    }

    state.shutdown();
    info!("shutting down");
    Ok(())
}

//! Echo Bot
//!
//! Answers `ping` with `PONG`, `/echo <text>` with the text, and
//! `count <n>` with the numbers `1..=n`, produced one at a time.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --config demos/echo_bot/courier.toml
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use courier::prelude::*;
use futures::StreamExt;
use futures::stream;

/// Largest accepted `count` argument.
const MAX_COUNT: u32 = 20;

#[derive(Debug, Parser)]
#[command(name = "echo-bot", version, about = "A small echo bot for the Courier gateway")]
struct Cli {
    /// Configuration file; searched in the working directory when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `production`.
    #[arg(short, long, env = "COURIER_PROFILE")]
    profile: Option<String>,
}

/// `count <n>`: replies `1`, `2`, ... `n`, one per step.
fn count_handler() -> Result<impl Handler> {
    let handler = handler_fn(r"(?i)count\s+(\d{1,3})", |ctx, groups| {
        let n = groups
            .get(1)
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);
        if n > MAX_COUNT {
            return fail(HandlerError::failed(format!("count {n} exceeds {MAX_COUNT}")));
        }
        debug!(correlation_id = %ctx.correlation_id(), n, "Counting");
        stream::iter(1..=n)
            .then(|i| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(i.to_string())
            })
            .boxed()
    })?;
    Ok(handler.named("count"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = CourierRuntime::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }

    let runtime = builder
        .handler(PingHandler::new()?)
        .handler(EchoHandler::new()?)
        .handler(count_handler()?)
        .build()
        .context("failed to start echo bot")?;

    info!(handlers = runtime.registry().len(), "Echo bot ready");
    runtime.run().await?;
    Ok(())
}

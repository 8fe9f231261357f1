//! Protey - line-oriented request client over TCP or UDP
//!
//! Reads lines from stdin, sends each to the configured server, and prints
//! the answer. The endpoint comes from the command line, the config file,
//! or an interactive prompt, in that order.

mod client;
mod config;
mod error;
mod net;
mod session;
mod tcp;
mod udp;

use crate::client::Client;
use crate::error::ClientError;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "protey")]
#[command(version = "0.1.0")]
#[command(about = "Line-oriented request client for the protey protocol", long_about = None)]
struct Args {
    /// Endpoint descriptor: <TCP|UDP>,<ipv4>,<port>
    endpoint: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "protey.conf")]
    config: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::Config::load_or_default(&args.config)?;

    let level: tracing::Level = config
        .logging
        .level
        .parse()
        .with_context(|| format!("Invalid logging level: {}", config.logging.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let endpoint = match args.endpoint.or(config.connection.endpoint) {
        Some(endpoint) => endpoint,
        None => prompt_for_endpoint()?,
    };

    let mut client = Client::new();
    if let Err(cause) = client.start(&endpoint) {
        bail!("could not start against {endpoint}: {cause}");
    }
    info!("started against {endpoint}");

    run_loop(&mut client)
}

fn prompt_for_endpoint() -> Result<String> {
    println!("Specify protocol(TCP/UDP),server IPv4 address and port like(TCP,10.10.10.10,5555)");
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read the endpoint descriptor")?;
    Ok(line.trim().to_string())
}

fn run_loop(client: &mut Client) -> Result<()> {
    println!("Input string");
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if let Some(answer) = send_with_reconnect(client, &line)? {
            println!("{answer}");
        }
        println!("Input string");
    }
    Ok(())
}

/// Drive one request to completion, re-establishing the session when the
/// connection breaks mid-exchange.
fn send_with_reconnect(client: &mut Client, line: &str) -> Result<Option<String>> {
    loop {
        match client.send(line) {
            Ok(answer) => return Ok(Some(answer.to_string())),
            Err(ClientError::NoDataToSend) => return Ok(None),
            Err(ClientError::ConnectionBroken) => {
                warn!("connection broken, reconnecting");
                if let Err(cause) = client.restart() {
                    bail!("could not re-establish the session: {cause}");
                }
            }
            Err(cause) => {
                error!("request failed: {cause}");
                return Ok(None);
            }
        }
    }
}

//! `huddle` binary: reads commands from stdin and prints the room to stdout.

use std::{
    io::{self, Write},
    time::Duration,
};

use clap::Parser;
use huddle_app::{LobbyConfig, Locale, SessionConfig};
use huddle_cli::{CliError, Output, Shell};
use huddle_core::env::SystemEnv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How often pending traffic is delivered and timeouts are checked.
const TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(name = "huddle", version, about = "Chat rooms from the terminal")]
struct Args {
    /// Display name. Asked for on start when missing.
    #[arg(short, long)]
    name: Option<String>,

    /// Language for system messages (`vi` or `en`).
    #[arg(short, long, default_value = "vi")]
    locale: Locale,

    /// Seconds to wait for a new room before giving up. 0 waits forever.
    #[arg(long, default_value_t = 10)]
    create_timeout_secs: u64,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let session_config = SessionConfig { locale: args.locale };
    let lobby_config = LobbyConfig {
        create_timeout: (args.create_timeout_secs > 0)
            .then(|| Duration::from_secs(args.create_timeout_secs)),
    };

    let (mut shell, greeting) =
        Shell::new(SystemEnv, args.name.as_deref(), session_config, lobby_config)?;
    write_output(&greeting)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        let output = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => shell.handle_line(&line)?,
                None => break,
            },
            _ = ticker.tick() => shell.tick()?,
        };
        write_output(&output)?;
        if output.quit {
            break;
        }
    }

    shell.shutdown()?;
    info!("bye");
    Ok(())
}

fn write_output(output: &Output) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    for line in &output.lines {
        writeln!(stdout, "{line}")?;
    }
    stdout.flush()?;
    Ok(())
}

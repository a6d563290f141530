//! tslog CLI
//!
//! Thin wrapper around tslog-core: a stress driver plus a TCP echo server and
//! client that use the logger as their sink.
//!
//! ## Usage
//!
//! ```bash
//! # 8 producer threads x 100 messages into test.log
//! tslog stress
//!
//! # Bigger run, no pauses, appending to an existing file
//! tslog stress --threads 32 --messages 1000 --delay-ms 0 --log-file big.log --append
//!
//! # Echo server on port 8080, logging to server.log
//! tslog serve
//!
//! # Send one message and print the echo, logging to client.log
//! tslog send "hello"
//! ```
//!
//! `TSLOG_PATH` / `TSLOG_APPEND` override the log file of any command when
//! `--log-file` is not given.

mod echo;
mod stress;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tslog_core::config::{ENV_APPEND, ENV_PATH};
use tslog_core::{Logger, LoggerConfig};

use crate::stress::StressOptions;

/// tslog - thread-safe asynchronous file logging
#[derive(Parser)]
#[command(name = "tslog")]
#[command(version = "0.1.0")]
#[command(about = "tslog - thread-safe asynchronous file logging")]
struct Cli {
    /// Increase diagnostic verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hammer the logger from many threads and verify the result
    Stress {
        /// Number of producer threads
        #[arg(short, long, default_value_t = 8)]
        threads: usize,

        /// Messages per producer
        #[arg(short, long, default_value_t = 100)]
        messages: usize,

        /// Base pause between messages in milliseconds (0 disables pauses)
        #[arg(long, default_value_t = 5)]
        delay_ms: u64,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Run the TCP echo server until Ctrl-C
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,

        /// Port to listen on (0 picks a free port)
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Send one message to the echo server and print the reply
    Send {
        /// Message to send
        message: String,

        /// Server host
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Server port
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        #[command(flatten)]
        log: LogArgs,
    },
}

/// Log file selection shared by every command.
#[derive(clap::Args)]
struct LogArgs {
    /// Log file (default depends on the command)
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Append to the log file instead of truncating it
    #[arg(short, long)]
    append: bool,
}

impl LogArgs {
    /// Resolve flags, then environment, then the command's defaults.
    fn config(&self, default_file: &str, default_append: bool) -> Result<LoggerConfig> {
        let mut config = LoggerConfig::from_env().context("invalid logger environment")?;
        if std::env::var_os(ENV_PATH).is_none() {
            config.path = PathBuf::from(default_file);
        }
        if std::env::var_os(ENV_APPEND).is_none() {
            config.append = default_append;
        }

        if let Some(path) = &self.log_file {
            config.path = path.clone();
        }
        config.append |= self.append;
        Ok(config)
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Create a logger and open its sink.
fn start_logger(config: &LoggerConfig) -> Result<Arc<Logger>> {
    let logger = Arc::new(Logger::new());
    logger.init_with(config).context("logger init failed")?;
    Ok(logger)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Stress {
            threads,
            messages,
            delay_ms,
            log,
        } => {
            let config = log.config("test.log", false)?;
            let logger = start_logger(&config)?;
            let options = StressOptions {
                threads,
                messages,
                delay: Duration::from_millis(delay_ms),
            };

            let path = config.path.clone();
            let report =
                tokio::task::spawn_blocking(move || stress::run(logger, &path, &options))
                    .await
                    .context("stress run aborted")??;

            println!(
                "done. {} of {} messages in {} ({:.2?})",
                report.written,
                report.expected,
                report.path.display(),
                report.elapsed
            );
            if config.append {
                println!("(append mode: file count includes earlier runs)");
            } else if report.written != report.expected {
                anyhow::bail!(
                    "expected {} lines but found {}",
                    report.expected,
                    report.written
                );
            }
        }

        Commands::Serve { bind, port, log } => {
            let config = log.config("server.log", false)?;
            let logger = start_logger(&config)?;

            let addr = SocketAddr::new(bind, port);
            let listener = match TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(error) => {
                    let _ = logger.error(format!("bind to {addr} failed: {error}"));
                    logger.shutdown();
                    return Err(error).with_context(|| format!("failed to bind {addr}"));
                }
            };
            println!("Listening on {}", listener.local_addr()?);
            println!("Logging to {}", config.path.display());
            println!("Press Ctrl+C to stop");

            let result = echo::run_server(Arc::clone(&logger), listener, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;

            tokio::task::spawn_blocking(move || logger.shutdown()).await?;
            result?;
            println!("Server stopped");
        }

        Commands::Send {
            message,
            host,
            port,
            log,
        } => {
            let config = log.config("client.log", true)?;
            let logger = start_logger(&config)?;

            let result = echo::send_message(&logger, SocketAddr::new(host, port), &message).await;
            tokio::task::spawn_blocking(move || logger.shutdown()).await?;

            let response = result?;
            println!("Response: {response}");
        }
    }

    Ok(())
}

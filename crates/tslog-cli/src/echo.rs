//! TCP echo server and client that record their traffic through the logger.
//!
//! Both sides treat the logger as a fire-and-forget sink.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};
use tslog_core::Logger;

/// Largest message read from a single connection.
pub const MAX_MESSAGE: usize = 1024;

/// Accept connections until `shutdown` resolves, echoing one message per client.
pub async fn run_server(
    logger: Arc<Logger>,
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let local = listener.local_addr()?;
    logger.info(format!("server listening on port {}", local.port()))?;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    logger.info(format!("client connected: {peer}"))?;
                    let logger = Arc::clone(&logger);
                    tokio::spawn(async move {
                        if let Err(error) = handle_client(&logger, stream).await {
                            warn!(%peer, %error, "client handler failed");
                            let _ = logger.error(format!("client {peer} failed: {error}"));
                        }
                    });
                }
                Err(error) => {
                    logger.warn(format!("failed to accept client: {error}"))?;
                }
            },
            _ = &mut shutdown => {
                debug!("echo server shutting down");
                logger.info("server stopping")?;
                break;
            }
        }
    }

    Ok(())
}

/// Read one message, log it, echo it back.
async fn handle_client(logger: &Logger, mut stream: TcpStream) -> Result<()> {
    let mut buffer = [0u8; MAX_MESSAGE];
    let read = stream.read(&mut buffer).await?;

    if read == 0 {
        logger.warn("client disconnected or sent nothing")?;
        return Ok(());
    }

    let message = String::from_utf8_lossy(&buffer[..read]).into_owned();
    logger.info(format!("message received: {message}"))?;
    stream.write_all(message.as_bytes()).await?;
    logger.info(format!("message echoed: {message}"))?;
    Ok(())
}

/// Send `message` to the echo server at `addr` and return its reply.
pub async fn send_message(logger: &Logger, addr: SocketAddr, message: &str) -> Result<String> {
    let mut stream = match TcpStream::connect(addr).await {
        Ok(stream) => stream,
        Err(error) => {
            logger.error(format!("connection to {addr} failed: {error}"))?;
            return Err(error).with_context(|| format!("failed to connect to {addr}"));
        }
    };

    stream.write_all(message.as_bytes()).await?;
    logger.info(format!("message sent: {message}"))?;

    let mut buffer = [0u8; MAX_MESSAGE];
    let read = stream.read(&mut buffer).await?;
    let response = String::from_utf8_lossy(&buffer[..read]).into_owned();
    if read > 0 {
        logger.info(format!("response received: {response}"))?;
    } else {
        logger.warn("server closed the connection without replying")?;
    }

    Ok(response)
}

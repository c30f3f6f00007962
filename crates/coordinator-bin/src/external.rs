//! External ingress: messages from web pages.
//!
//! The browser bridge forwards cross-origin messages here with the sender
//! origin attached. Everything goes through the trust filter before it can
//! touch the coordinator; a rejected message is dropped with no reply at
//! all, so untrusted senders learn nothing.

use coordinator_auth::{AuthCoordinator, ExternalMessage};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// A cross-origin message with its transport-attested sender origin.
#[derive(Debug, Deserialize)]
pub struct ExternalEnvelope {
    /// Origin of the sending page, as attested by the browser bridge.
    pub origin: String,
    /// The message itself.
    pub message: ExternalMessage,
}

/// Listen for external messages until shutdown.
pub async fn run_external_ingress(
    socket_path: String,
    coordinator: Arc<AuthCoordinator>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let path = Path::new(&socket_path);
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }

    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, path = %socket_path, "Failed to bind external ingress");
            return;
        }
    };

    info!(path = %socket_path, "External ingress listening");

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let coordinator = coordinator.clone();
                        tokio::spawn(async move {
                            handle_external_connection(stream, coordinator).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "External ingress accept error");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("External ingress shutting down");
                break;
            }
        }
    }

    let _ = std::fs::remove_file(&socket_path);
}

/// Handle one external connection.
async fn handle_external_connection(stream: UnixStream, coordinator: Arc<AuthCoordinator>) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "External connection read error");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Unparseable input never reaches the coordinator and gets no reply.
        let envelope: ExternalEnvelope = match serde_json::from_str(trimmed) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "Dropping unparseable external message");
                continue;
            }
        };

        let reply = match coordinator
            .handle_external(&envelope.message, &envelope.origin)
            .await
        {
            // Trust filter dropped it: no reply, no state change.
            None => continue,
            Some(Ok(())) => serde_json::json!({ "success": true }),
            Some(Err(error)) => serde_json::json!({ "error": error.to_string() }),
        };

        let reply_line = format!("{}\n", reply);
        if writer.write_all(reply_line.as_bytes()).await.is_err() {
            break;
        }
        let _ = writer.flush().await;
    }
}

//! IPC server, client, and broadcast notifier.
//!
//! Each connection is request/response over NDJSON; status-change events are
//! pushed to every connected context on the same stream. Responses carry an
//! `id`, events carry a `type`, so readers can tell them apart.

use crate::{error_codes, Action, Event, IpcError, IpcResult, Request, Response};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

/// Handler function type for IPC actions.
pub type HandlerFn =
    Box<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

/// Fans status-change events out to every connected context.
///
/// Delivery is fire-and-forget and best-effort: no receivers is not an
/// error, and one unreachable recipient never blocks the others.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Event>,
}

impl Notifier {
    /// Create a new notifier.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Broadcast an event. Succeeds even when nobody is listening.
    pub fn notify(&self, event: Event) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of contexts currently listening.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// IPC server that listens on a Unix domain socket.
pub struct IpcServer {
    socket_path: String,
    handlers: Arc<RwLock<HashMap<Action, HandlerFn>>>,
    shutdown_tx: broadcast::Sender<()>,
    notifier: Notifier,
}

impl IpcServer {
    /// Create a new IPC server.
    pub fn new(socket_path: &str) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            socket_path: socket_path.to_string(),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
            notifier: Notifier::new(),
        }
    }

    /// Register a handler for an action.
    pub async fn register_handler<F, Fut>(&self, action: Action, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let boxed_handler: HandlerFn = Box::new(move |req| Box::pin(handler(req)));
        self.handlers.write().await.insert(action, boxed_handler);
    }

    /// Get the notifier for broadcasting events.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Get a shutdown receiver.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Get a shutdown sender (for handlers that need to trigger shutdown).
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Start the server and listen for connections.
    pub async fn run(&self) -> IpcResult<()> {
        // Remove existing socket file
        let socket_path = Path::new(&self.socket_path);
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path, "IPC server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handlers = self.handlers.clone();
        let notifier = self.notifier.clone();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let handlers = handlers.clone();
                            let notifier = notifier.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handlers, notifier).await {
                                    error!(error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("IPC server shutting down");
                    break;
                }
            }
        }

        // Cleanup socket file
        let _ = std::fs::remove_file(&self.socket_path);

        Ok(())
    }
}

/// Handle a single client connection.
///
/// Requests are answered in order; events are interleaved as they arrive.
/// A context that went away mid-push just drops its connection.
async fn handle_connection(
    stream: UnixStream,
    handlers: Arc<RwLock<HashMap<Action, HandlerFn>>>,
    notifier: Notifier,
) -> IpcResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    let mut event_rx = notifier.subscribe();

    debug!("Context connected");

    loop {
        tokio::select! {
            read_result = reader.read_line(&mut line) => {
                let bytes_read = read_result?;
                if bytes_read == 0 {
                    debug!("Context disconnected");
                    break;
                }

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    line.clear();
                    continue;
                }

                let response = dispatch_line(trimmed, &handlers).await;
                line.clear();

                let response_json = response.to_json()?;
                debug!(response = %response_json, "Sending response");
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }

            event_result = event_rx.recv() => {
                match event_result {
                    Ok(event) => {
                        if !forward_event(&mut writer, &event).await {
                            debug!("Failed to push event, context disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event channel closed");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "Context lagged, skipped events");
                        // Keep receiving; the context re-queries on the next event
                    }
                }
            }
        }
    }

    Ok(())
}

/// Parse one request line and dispatch it.
///
/// The action enum is the exhaustive dispatch table; anything that does not
/// parse into it is answered with a malformed-message error.
async fn dispatch_line(
    trimmed: &str,
    handlers: &Arc<RwLock<HashMap<Action, HandlerFn>>>,
) -> Response {
    debug!(request = %trimmed, "Received request");

    let request = match Request::from_json(trimmed) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "Malformed request");
            return Response::error(
                "",
                error_codes::MALFORMED_MESSAGE,
                &format!("Malformed message: {}", e),
            );
        }
    };

    let request_id = request.id.clone();
    let action = request.action.clone();

    let handlers = handlers.read().await;
    if let Some(handler) = handlers.get(&action) {
        handler(request).await
    } else {
        Response::error(
            &request_id,
            error_codes::ACTION_NOT_FOUND,
            &format!("No handler for action: {:?}", action),
        )
    }
}

/// Push one event to a connection. Returns false if the context is gone.
async fn forward_event(writer: &mut OwnedWriteHalf, event: &Event) -> bool {
    let event_json = match event.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize event");
            return true;
        }
    };

    if writer.write_all(event_json.as_bytes()).await.is_err() {
        return false;
    }
    if writer.write_all(b"\n").await.is_err() {
        return false;
    }
    writer.flush().await.is_ok()
}

/// IPC client for view contexts.
pub struct IpcClient {
    socket_path: String,
}

impl IpcClient {
    /// Create a new IPC client.
    pub fn new(socket_path: &str) -> Self {
        Self {
            socket_path: socket_path.to_string(),
        }
    }

    /// Send a request and wait for its response.
    ///
    /// Event lines pushed on the same connection are skipped; the response
    /// is matched by shape (`id` field).
    pub async fn call(&self, request: Request) -> IpcResult<Response> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| IpcError::Socket(format!("Failed to connect: {}", e)))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let request_json = request.to_json()?;
        writer.write_all(request_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(IpcError::ConnectionClosed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Events may interleave with the response on this stream
            if Event::from_json(trimmed).is_ok() {
                continue;
            }

            return Ok(Response::from_json(trimmed)?);
        }
    }

    /// Send a request, failing with `IpcError::Timeout` if it does not
    /// settle in time. The request itself is not cancellable server-side;
    /// only the caller stops waiting.
    pub async fn call_with_timeout(
        &self,
        request: Request,
        timeout: std::time::Duration,
    ) -> IpcResult<Response> {
        match tokio::time::timeout(timeout, self.call(request)).await {
            Ok(result) => result,
            Err(_) => Err(IpcError::Timeout),
        }
    }

    /// Send an action with no parameters.
    pub async fn call_action(&self, action: Action) -> IpcResult<Response> {
        self.call(Request::new(action)).await
    }

    /// Send an action with parameters.
    pub async fn call_action_with_params(
        &self,
        action: Action,
        params: serde_json::Value,
    ) -> IpcResult<Response> {
        self.call(Request::with_params(action, params)).await
    }

    /// Check if the coordinator is running.
    pub async fn is_coordinator_running(&self) -> bool {
        self.call_action(Action::Health).await.is_ok()
    }

    /// Open a connection that just listens for pushed events.
    pub async fn listen(&self) -> IpcResult<EventSubscription> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| IpcError::Socket(format!("Failed to connect: {}", e)))?;

        let (reader, _writer) = stream.into_split();
        Ok(EventSubscription {
            reader: BufReader::new(reader),
            _writer,
            line_buffer: String::new(),
        })
    }
}

/// A listening connection that yields pushed events.
pub struct EventSubscription {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    _writer: OwnedWriteHalf,
    line_buffer: String,
}

impl EventSubscription {
    /// Receive the next event, blocking until one arrives.
    ///
    /// Returns `None` when the connection closes.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer).await {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line_buffer.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match Event::from_json(trimmed) {
                        Ok(event) => return Some(event),
                        Err(_) => continue,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Read error while listening for events");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;
    use std::time::Duration;

    async fn start_test_server(socket_path: &str) -> Arc<IpcServer> {
        let server = Arc::new(IpcServer::new(socket_path));

        server
            .register_handler(Action::Health, |req| async move {
                Response::success(&req.id, serde_json::json!({"status": "ok"}))
            })
            .await;

        let run_server = server.clone();
        tokio::spawn(async move {
            let _ = run_server.run().await;
        });

        // Wait for the socket to appear
        for _ in 0..50 {
            if Path::new(socket_path).exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        server
    }

    #[tokio::test]
    async fn test_client_against_absent_coordinator() {
        let client = IpcClient::new("/tmp/worklens-test-absent.sock");
        assert!(!client.is_coordinator_running().await);

        let result = client.call_action(Action::Health).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_request_response_roundtrip() {
        let dir = std::env::temp_dir().join("worklens-ipc-test-rr");
        let _ = std::fs::create_dir_all(&dir);
        let socket_path = dir.join("coordinator.sock");
        let socket_path = socket_path.to_str().unwrap();

        let server = start_test_server(socket_path).await;

        let client = IpcClient::new(socket_path);
        let response = client.call_action(Action::Health).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.result.unwrap()["status"], "ok");

        server.shutdown();
    }

    #[tokio::test]
    async fn test_unregistered_action_gets_error_response() {
        let dir = std::env::temp_dir().join("worklens-ipc-test-unreg");
        let _ = std::fs::create_dir_all(&dir);
        let socket_path = dir.join("coordinator.sock");
        let socket_path = socket_path.to_str().unwrap();

        let server = start_test_server(socket_path).await;

        let client = IpcClient::new(socket_path);
        let response = client.call_action(Action::Logout).await.unwrap();
        assert!(!response.is_success());
        assert_eq!(
            response.error.unwrap().code,
            error_codes::ACTION_NOT_FOUND
        );

        server.shutdown();
    }

    #[tokio::test]
    async fn test_events_reach_listening_context() {
        let dir = std::env::temp_dir().join("worklens-ipc-test-events");
        let _ = std::fs::create_dir_all(&dir);
        let socket_path = dir.join("coordinator.sock");
        let socket_path = socket_path.to_str().unwrap();

        let server = start_test_server(socket_path).await;

        let client = IpcClient::new(socket_path);
        let mut subscription = client.listen().await.unwrap();

        // Give the connection task a moment to subscribe
        tokio::time::sleep(Duration::from_millis(50)).await;

        server.notifier().notify(Event::new(
            EventKind::AuthStatusChanged,
            serde_json::json!({"isAuthenticated": false}),
        ));

        let event = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type, EventKind::AuthStatusChanged);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_broadcast_with_no_listeners_succeeds() {
        let notifier = Notifier::new();
        assert_eq!(notifier.receiver_count(), 0);

        // Nobody is listening; this must not error or panic
        notifier.notify(Event::new(EventKind::AuthStatusChanged, serde_json::json!({})));
        notifier.notify(Event::new(EventKind::SettingsUpdated, serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_notifier_delivers_to_subscriber() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.notify(Event::new(
            EventKind::SettingsUpdated,
            serde_json::json!({"theme": "dark"}),
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EventKind::SettingsUpdated);
        assert_eq!(event.data["theme"], "dark");
    }

    #[tokio::test]
    async fn test_call_with_timeout_expires() {
        // No server; connect fails fast, but exercise the timeout wrapper
        // against a handler that never answers.
        let dir = std::env::temp_dir().join("worklens-ipc-test-timeout");
        let _ = std::fs::create_dir_all(&dir);
        let socket_path = dir.join("coordinator.sock");
        let socket_path = socket_path.to_str().unwrap();

        let server = Arc::new(IpcServer::new(socket_path));
        server
            .register_handler(Action::Health, |req| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Response::success(&req.id, serde_json::json!({}))
            })
            .await;

        let run_server = server.clone();
        tokio::spawn(async move {
            let _ = run_server.run().await;
        });
        for _ in 0..50 {
            if Path::new(socket_path).exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let client = IpcClient::new(socket_path);
        let result = client
            .call_with_timeout(Request::new(Action::Health), Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(IpcError::Timeout)));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_server_shutdown_signal() {
        let server = IpcServer::new("/tmp/worklens-test-shutdown.sock");
        let mut receiver = server.shutdown_receiver();

        server.shutdown();

        let result =
            tokio::time::timeout(Duration::from_millis(100), receiver.recv()).await;
        assert!(result.is_ok());
    }
}

//! Native identity-provider flow: token acquisition and profile fetch.

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Default identity callback port.
pub const DEFAULT_CALLBACK_PORT: u16 = 17805;

/// Default identity flow timeout in seconds.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Google userinfo endpoint.
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Profile as reported by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderProfile {
    /// Account email
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub picture: String,
}

/// Obtains identity-provider tokens and profiles.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Request a provider access token, interactively if needed.
    async fn acquire_token(&self, interactive: bool) -> AuthResult<String>;

    /// Fetch the user's profile from the identity provider.
    async fn fetch_profile(&self, provider_token: &str) -> AuthResult<ProviderProfile>;
}

/// Google identity broker using a localhost callback listener.
///
/// The consent page lives on the companion web app; it redirects back to
/// `http://localhost:{port}/identity-callback` with the provider access
/// token in the query string. The caller is responsible for opening the
/// browser to [`GoogleIdentityBroker::consent_url`].
pub struct GoogleIdentityBroker {
    web_app_url: String,
    port: u16,
    timeout_secs: u64,
    http_client: Client,
}

impl GoogleIdentityBroker {
    /// Create a new broker with explicit port and timeout.
    pub fn new(web_app_url: &str, port: u16, timeout_secs: u64) -> Self {
        Self {
            web_app_url: web_app_url.trim_end_matches('/').to_string(),
            port,
            timeout_secs,
            http_client: Client::new(),
        }
    }

    /// Create a broker with default settings.
    pub fn with_defaults(web_app_url: &str) -> Self {
        Self::new(
            web_app_url,
            DEFAULT_CALLBACK_PORT,
            DEFAULT_CALLBACK_TIMEOUT_SECS,
        )
    }

    /// The callback URL the consent page redirects to.
    pub fn callback_url(&self) -> String {
        format!("http://localhost:{}/identity-callback", self.port)
    }

    /// The consent page URL to open in the browser.
    pub fn consent_url(&self) -> String {
        let callback = urlencoding::encode(&self.callback_url()).into_owned();
        format!(
            "{}/extension-auth?provider=google&callback={}",
            self.web_app_url, callback
        )
    }

    /// Wait for the consent page to redirect back with a provider token.
    async fn wait_for_token(&self) -> AuthResult<String> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to bind to {}: {}", addr, e)))?;

        info!(port = self.port, "Identity callback listener ready");

        let (tx, rx) = oneshot::channel::<Result<String, String>>();
        let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let listener_handle = tokio::spawn({
            let tx = tx.clone();
            async move {
                loop {
                    match listener.accept().await {
                        Ok((mut socket, _)) => {
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_callback(&mut socket, tx).await {
                                    error!("Error handling identity callback: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        let timeout = tokio::time::Duration::from_secs(self.timeout_secs);
        let outcome = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err("Internal error: channel closed".to_string()),
            Err(_) => Err("Timed out waiting for identity provider".to_string()),
        };

        listener_handle.abort();

        outcome.map_err(AuthError::Provider)
    }
}

#[async_trait]
impl IdentityBroker for GoogleIdentityBroker {
    async fn acquire_token(&self, interactive: bool) -> AuthResult<String> {
        if !interactive {
            // Without a user present there is nothing to wait for.
            return Err(AuthError::Provider(
                "Interactive consent required".to_string(),
            ));
        }

        info!(url = %self.consent_url(), "Waiting for identity provider consent");
        self.wait_for_token().await
    }

    async fn fetch_profile(&self, provider_token: &str) -> AuthResult<ProviderProfile> {
        debug!(url = USERINFO_URL, "Fetching provider profile");

        let response = self
            .http_client
            .get(USERINFO_URL)
            .header("Authorization", format!("Bearer {}", provider_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Provider profile fetch failed");
            return Err(AuthError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let profile: ProviderProfile = response.json().await?;
        debug!(email = %profile.email, "Provider profile fetched");

        Ok(profile)
    }
}

/// Handle one incoming callback connection.
async fn handle_callback(
    socket: &mut tokio::net::TcpStream,
    tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<Result<String, String>>>>>,
) -> AuthResult<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    debug!(request = %request_line.trim(), "Identity callback request");

    if !request_line.starts_with("GET ") {
        send_response(&mut writer, 405, "Method Not Allowed", "Method Not Allowed").await?;
        return Ok(());
    }

    let path_end = request_line.find(" HTTP/").unwrap_or(request_line.len());
    let path = &request_line[4..path_end];

    if !path.starts_with("/identity-callback") {
        send_response(&mut writer, 404, "Not Found", "Not Found").await?;
        return Ok(());
    }

    let query = path.find('?').map(|idx| &path[idx + 1..]).unwrap_or("");

    let mut access_token = None;
    let mut callback_error = None;
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "access_token" => access_token = Some(value),
            "error" => callback_error = Some(value),
            _ => {}
        }
    }

    let outcome = if let Some(err) = callback_error {
        send_response(&mut writer, 200, "OK", &result_page(false)).await?;
        Err(err)
    } else if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        send_response(&mut writer, 200, "OK", &result_page(true)).await?;
        Ok(token)
    } else {
        send_response(&mut writer, 200, "OK", &result_page(false)).await?;
        Err("Identity provider returned no token".to_string())
    };

    if let Some(tx) = tx.lock().await.take() {
        let _ = tx.send(outcome);
    }

    Ok(())
}

/// Send a minimal HTTP response.
async fn send_response(
    writer: &mut tokio::net::tcp::WriteHalf<'_>,
    status_code: u16,
    status_text: &str,
    body: &str,
) -> AuthResult<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn result_page(success: bool) -> String {
    let (title, message) = if success {
        ("Signed in", "You can close this tab and return to Worklens.")
    } else {
        ("Sign-in failed", "You can close this tab and try again.")
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Worklens - {}</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px;">
<h1>{}</h1>
<p>{}</p>
<script>setTimeout(() => window.close(), 2000);</script>
</body>
</html>"#,
        title, title, message
    )
}

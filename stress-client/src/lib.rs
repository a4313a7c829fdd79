//! Facade HTTP Client
//!
//! A small, type-safe client for the strategy execution facade used by the
//! stress tester.
//!
//! The facade exposes a single POST endpoint; every request is a JSON object
//! carrying the credentials and a `command` field (`play`, `pull`, `stop`,
//! `stop-all`). This crate hides that shape behind typed methods and the
//! [`FacadeApi`] trait, and provides the [`RetryPolicy`] used to absorb
//! transport failures.
//!
//! # Example
//!
//! ```no_run
//! use stress_client::FacadeClient;
//! use stress_core::dto::play::PlayParams;
//!
//! #[tokio::main]
//! async fn main() -> stress_client::Result<()> {
//!     let client = FacadeClient::new("http://localhost:8080/backend-restful", "user", "secret")?;
//!
//!     let response = client.play(&PlayParams::default()).await?;
//!     println!("Play response: {:?}", response);
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod feeds;
mod play;
pub mod retry;
mod stop;

// Re-export commonly used types
pub use api::FacadeApi;
pub use error::{ClientError, Result};
pub use retry::RetryPolicy;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use stress_core::dto::command::CommandMessage;
use tracing::debug;

/// Idle connections kept per host; sized for the largest passes
const MAX_IDLE_PER_HOST: usize = 300;

/// HTTP client for the facade API
#[derive(Debug, Clone)]
pub struct FacadeClient {
    /// Endpoint URL (e.g., "http://localhost:8080/backend-restful")
    url: String,
    /// Account name sent with every command
    username: String,
    /// Account password sent with every command
    password: String,
    /// HTTP client instance
    client: Client,
}

impl FacadeClient {
    /// Create a new facade client
    ///
    /// # Arguments
    /// * `url` - The facade endpoint
    /// * `username` - The account name
    /// * `password` - The password of the account
    ///
    /// Fails when the pooled HTTP client cannot be built.
    ///
    /// # Example
    /// ```
    /// use stress_client::FacadeClient;
    ///
    /// let client = FacadeClient::new("http://localhost:8080/backend-restful", "user", "secret")?;
    /// # Ok::<(), stress_client::ClientError>(())
    /// ```
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()?;
        Ok(Self::with_client(url, username, password, client))
    }

    /// Create a new facade client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        client: Client,
    ) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client,
        }
    }

    /// Get the endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    // =============================================================================
    // Transport
    // =============================================================================

    /// Send one command and return the decoded JSON reply
    async fn send_command<T: Serialize>(
        &self,
        command: &'static str,
        body: T,
    ) -> Result<JsonValue> {
        let message = CommandMessage {
            username: &self.username,
            password: &self.password,
            command,
            body,
        };

        debug!("-> {}", command);
        let response = self.client.post(&self.url).json(&message).send().await?;

        self.handle_response(response).await
    }

    /// Handle a facade response and decode it as JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or parses the response body if successful.
    async fn handle_response(&self, response: reqwest::Response) -> Result<JsonValue> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        debug!("<- {}", body);

        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

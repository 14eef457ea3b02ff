// --- File: crates/termin_common/src/http/client.rs ---
use once_cell::sync::Lazy;
use reqwest::{Client, Error as ReqwestError, Response};
use std::time::Duration;

/// Default timeout for outbound HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A shared HTTP client reused across the application.
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    create_client(DEFAULT_TIMEOUT_SECS, true).unwrap_or_else(|_| Client::new())
});

/// Creates a new HTTP client with custom configuration.
///
/// # Arguments
///
/// * `timeout_secs` - The timeout in seconds for the client
/// * `follow_redirects` - Whether the client should follow redirects
pub fn create_client(timeout_secs: u64, follow_redirects: bool) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(if follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        })
        .build()
}

/// POSTs `body` as JSON to `url` with the shared client.
pub async fn post<T: serde::Serialize>(url: &str, body: &T) -> Result<Response, ReqwestError> {
    HTTP_CLIENT.post(url).json(body).send().await
}

//! Helper functions shared by the gateway clients.

use std::time::Duration;

/// Builds the HTTP client used for gateway calls.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("voucher-checkout/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

//! Application configuration for the checkout CLI.
//!
//! Values are read from environment variables once, on first access to
//! [`APP_CONFIG`]. Library types never read the environment themselves: they
//! receive [`GatewayEndpoints`] and [`crate::api::session::SessionOptions`] built
//! from this struct, so callers embedding the crate can configure them freely.
//!
//! # Security Notes
//! - The gateway public key is a client-side identifier and may be logged
//! - Card data never passes through configuration

use crate::{consts, models::checkout::GatewayEnv};
use envconfig::Envconfig;
use std::{sync::LazyLock, time::Duration};

/// Checkout configuration read from the environment.
#[derive(Envconfig, Clone, Debug)]
pub struct AppConfig {
    /// Gateway environment (NON-SENSITIVE)
    /// Values: "staging", anything else selects production
    #[envconfig(default = "production")]
    pub gateway_env: GatewayEnv,

    /// Pagar.me public key passed as `appId` (SEMI-SENSITIVE)
    /// Example: "pk_test_abc123"
    #[envconfig(default = "")]
    pub gateway_public_key: String,

    /// BIN bureau base URL, the 6-digit BIN is appended as a path segment
    #[envconfig(default = "https://api.pagar.me/bin/v1")]
    pub bin_lookup_base_url: String,

    /// Tokens endpoint used for the production environment
    #[envconfig(default = "https://api.pagar.me/core/v5/tokens")]
    pub tokens_url_production: String,

    /// Tokens endpoint used for the staging environment
    #[envconfig(default = "https://stgapi.mundipagg.com/core/v5/tokens")]
    pub tokens_url_staging: String,

    /// Timeout applied to every gateway request
    #[envconfig(default = "30")]
    pub http_timeout_secs: u64,

    /// Quiet period before a BIN lookup fires
    #[envconfig(default = "300")]
    pub bin_debounce_ms: u64,

    /// IANA time zone used to decide whether a card has expired
    #[envconfig(default = "America/Sao_Paulo")]
    pub checkout_timezone: String,

    /// 🔒 SENSITIVE: Logfire write token, logs go to stderr when absent
    pub logfire_token: Option<String>,
}

impl AppConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn bin_debounce(&self) -> Duration {
        Duration::from_millis(self.bin_debounce_ms)
    }

    /// Parses the configured time zone, falling back to São Paulo.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.checkout_timezone.parse().unwrap_or_else(|_| {
            log::warn!(
                "unknown time zone {}, using {}",
                self.checkout_timezone,
                consts::CHECKOUT_TIMEZONE
            );
            consts::CHECKOUT_TIMEZONE
        })
    }

    pub fn endpoints(&self) -> GatewayEndpoints {
        GatewayEndpoints {
            bin_base_url: self.bin_lookup_base_url.clone(),
            tokens_url_production: self.tokens_url_production.clone(),
            tokens_url_staging: self.tokens_url_staging.clone(),
            timeout: self.http_timeout(),
        }
    }
}

/// Gateway URLs shared by the BIN and tokenization clients.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayEndpoints {
    pub bin_base_url: String,
    pub tokens_url_production: String,
    pub tokens_url_staging: String,
    pub timeout: Duration,
}

impl GatewayEndpoints {
    /// Points every endpoint at a single host. Used against local mocks.
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            bin_base_url: format!("{base_url}/bin/v1"),
            tokens_url_production: format!("{base_url}/core/v5/tokens"),
            tokens_url_staging: format!("{base_url}/staging/core/v5/tokens"),
            timeout: consts::HTTP_TIMEOUT,
        }
    }

    pub fn tokens_url(&self, env: GatewayEnv) -> &str {
        match env {
            GatewayEnv::Staging => &self.tokens_url_staging,
            GatewayEnv::Production => &self.tokens_url_production,
        }
    }
}

impl Default for GatewayEndpoints {
    fn default() -> Self {
        Self {
            bin_base_url: consts::PAGARME_BIN_BASE_URL.into(),
            tokens_url_production: consts::PAGARME_TOKENS_URL_PRODUCTION.into(),
            tokens_url_staging: consts::PAGARME_TOKENS_URL_STAGING.into(),
            timeout: consts::HTTP_TIMEOUT,
        }
    }
}

/// Global configuration instance.
///
/// Every field has a default except the optional Logfire token, so loading only
/// fails on malformed values (e.g. a non-numeric timeout).
pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(|| {
    AppConfig::init_from_env()
        .expect("Failed to load checkout configuration. Check environment variables.")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_url_by_env() {
        let endpoints = GatewayEndpoints::default();

        assert_eq!(
            endpoints.tokens_url(GatewayEnv::Staging),
            consts::PAGARME_TOKENS_URL_STAGING
        );
        assert_eq!(
            endpoints.tokens_url(GatewayEnv::Production),
            consts::PAGARME_TOKENS_URL_PRODUCTION
        );
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let endpoints = GatewayEndpoints::with_base_url("http://127.0.0.1:1234/");

        assert_eq!(endpoints.bin_base_url, "http://127.0.0.1:1234/bin/v1");
        assert_eq!(
            endpoints.tokens_url(GatewayEnv::Production),
            "http://127.0.0.1:1234/core/v5/tokens"
        );
    }
}

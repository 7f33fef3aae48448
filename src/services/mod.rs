pub mod bin_lookup;
pub mod tokenization;

use crate::{errors::TokenizationError, models};
use async_trait::async_trait;
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BinLookupService: Send + Sync {
    /// Resolves a 6-digit BIN. Never fails: problems yield `BinLookup::Unknown`.
    async fn lookup_bin(&self, bin: &str) -> models::bin::BinLookup;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenizationService: Send + Sync {
    /// Exchanges card data for a single-use token. Exactly one attempt, no retries.
    async fn create_card_token(
        &self,
        request: &models::card::CardTokenRequest,
        public_key: &str,
        env: models::checkout::GatewayEnv,
    ) -> Result<String, TokenizationError>;
}

pub type ImplBinLookupService = Arc<dyn BinLookupService>;
pub type ImplTokenizationService = Arc<dyn TokenizationService>;

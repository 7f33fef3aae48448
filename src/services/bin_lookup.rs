//! # BIN Bureau Client
//!
//! Resolves the first six digits of a card against the Pagar.me BIN API
//! (`GET /bin/v1/{bin}`). Lookups only ever inform masking and brand
//! highlighting, so every failure is logged and collapsed into
//! [`BinLookup::Unknown`] instead of interrupting the user.

use crate::{
    config::GatewayEndpoints,
    consts, metric,
    models::bin::{BinLookup, BinPayload},
    utils,
};
use anyhow::Context;
use async_trait::async_trait;

#[derive(Clone)]
pub struct PagarmeBinClient {
    client: reqwest::Client,
    base_url: String,
}

impl PagarmeBinClient {
    pub fn new(endpoints: &GatewayEndpoints) -> anyhow::Result<Self> {
        Ok(Self {
            client: utils::build_http_client(endpoints.timeout)?,
            base_url: endpoints.bin_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, bin: &str) -> anyhow::Result<Option<BinPayload>> {
        let response = self
            .client
            .get(format!("{}/{bin}", self.base_url))
            .header("Accept", "application/json")
            .send()
            .await
            .context("failed to reach BIN bureau")?;

        if !response.status().is_success() {
            log::warn!("BIN lookup for {bin} failed with status {}", response.status());
            return Ok(None);
        }

        let payload = response
            .json::<BinPayload>()
            .await
            .context("failed to parse BIN bureau response")?;

        Ok(Some(payload))
    }
}

#[async_trait]
impl crate::services::BinLookupService for PagarmeBinClient {
    async fn lookup_bin(&self, bin: &str) -> BinLookup {
        if bin.len() != consts::BIN_LENGTH || !bin.bytes().all(|b| b.is_ascii_digit()) {
            return BinLookup::Unknown;
        }

        log::info!("fetching BIN info for {bin}");

        let lookup = match self.fetch(bin).await {
            Ok(Some(payload)) => BinLookup::from_payload(bin, payload),
            Ok(None) => BinLookup::Unknown,
            Err(e) => {
                log::warn!("BIN lookup for {bin} failed: {e:#}");
                BinLookup::Unknown
            }
        };

        metric::incr_bin_lookup_statds(match &lookup {
            BinLookup::Found(_) => "found",
            BinLookup::Unknown => "unknown",
        });

        lookup
    }
}

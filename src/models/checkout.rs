use super::bin::CardBrand;
use crate::consts;
use derive_more::Display;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, str::FromStr};

/// Gateway environment. Anything other than `staging` means production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEnv {
    #[default]
    #[display("production")]
    Production,
    #[display("staging")]
    Staging,
}

impl FromStr for GatewayEnv {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_lowercase().as_str() {
            "staging" => GatewayEnv::Staging,
            _ => GatewayEnv::Production,
        })
    }
}

impl<'de> Deserialize<'de> for GatewayEnv {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        let Ok(env) = value.parse::<GatewayEnv>();
        Ok(env)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    #[display("idle")]
    Idle,
    #[display("validating_bin")]
    ValidatingBin,
    #[display("processing")]
    Processing,
    #[display("error")]
    Error,
    #[display("success")]
    Success,
}

/// Single-use card token and the brand it was resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResult {
    pub token: String,
    pub brand: CardBrand,
}

/// Notifications delivered to the host page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CheckoutEvent {
    Success { token: String, brand: CardBrand },
    Error { error: String },
    Closed,
}

impl From<TokenResult> for CheckoutEvent {
    fn from(result: TokenResult) -> Self {
        CheckoutEvent::Success {
            token: result.token,
            brand: result.brand,
        }
    }
}

/// Options the host passes when opening the checkout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutOptions {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    /// e.g. `["alimentação", "refeição"]`
    pub voucher_types: Vec<String>,
    /// Accepted brands, empty accepts every brand.
    pub voucher_brands: Vec<CardBrand>,
    pub public_key: String,
    pub env: GatewayEnv,
}

impl CheckoutOptions {
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(consts::DEFAULT_CURRENCY)
    }

    pub fn title(&self) -> String {
        if self.voucher_types.is_empty() {
            return consts::DEFAULT_CHECKOUT_TITLE.to_string();
        }
        format!("Vale {}", self.voucher_types.join(" ou "))
    }

    /// Amount rendered the pt-BR way, e.g. `R$ 1.234,50`.
    pub fn formatted_amount(&self) -> String {
        format_currency(self.amount.unwrap_or_default(), self.currency())
    }
}

fn currency_symbol(currency: &str) -> &str {
    match currency {
        "BRL" => "R$",
        "USD" => "US$",
        "EUR" => "€",
        other => other,
    }
}

pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{rounded:.2}");
    let (integer, cents) = plain.split_once('.').unwrap_or((&plain, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{} {grouped},{cents}", currency_symbol(currency))
}

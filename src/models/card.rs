use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Form fields, named as the widget names its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub enum CardField {
    #[display("cardNumber")]
    #[serde(rename = "cardNumber")]
    Number,
    #[display("cardName")]
    #[serde(rename = "cardName")]
    HolderName,
    #[display("expiry")]
    #[serde(rename = "expiry")]
    Expiry,
    #[display("cvv")]
    #[serde(rename = "cvv")]
    Cvv,
    #[display("cpf")]
    #[serde(rename = "cpf")]
    TaxId,
}

/// Raw values as the user typed them, already masked for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardInput {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
    /// `###.###.###-##`
    pub tax_id: String,
}

impl CardInput {
    pub fn set(&mut self, field: CardField, value: String) {
        match field {
            CardField::Number => self.number = value,
            CardField::HolderName => self.holder_name = value,
            CardField::Expiry => self.expiry = value,
            CardField::Cvv => self.cvv = value,
            CardField::TaxId => self.tax_id = value,
        }
    }

    pub fn number_digits(&self) -> String {
        crate::api::format::only_digits(&self.number)
    }

    /// Splits the masked expiry into its month and year parts.
    pub fn expiry_parts(&self) -> (&str, &str) {
        self.expiry.split_once('/').unwrap_or((&self.expiry, ""))
    }
}

/// Field name to human readable message.
pub type ValidationErrors = BTreeMap<CardField, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenCard {
    pub number: String,
    pub holder_name: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvv: String,
}

/// Body of `POST /core/v5/tokens`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTokenRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub card: TokenCard,
}

impl CardTokenRequest {
    pub fn new(card: TokenCard) -> Self {
        Self { kind: "card", card }
    }

    /// Builds the request from validated input, `None` if the expiry isn't numeric.
    pub fn from_input(input: &CardInput) -> Option<Self> {
        let (month, year) = input.expiry_parts();

        Some(Self::new(TokenCard {
            number: input.number_digits(),
            holder_name: input.holder_name.trim().to_string(),
            exp_month: month.parse().ok()?,
            exp_year: year.parse().ok()?,
            cvv: input.cvv.clone(),
        }))
    }
}

/// Successful gateway answer, only the token id is used.
#[derive(Debug, Deserialize)]
pub struct CardTokenResponse {
    pub id: Option<String>,
}

/// Error payload of a rejected tokenization.
#[derive(Debug, Default, Deserialize)]
pub struct GatewayErrorBody {
    pub message: Option<String>,
    pub errors: Option<serde_json::Value>,
}

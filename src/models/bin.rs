use crate::consts;
use derive_more::Display;
use serde::{Deserialize, Serialize, Serializer};

/// Card brand as reported by the BIN bureau, normalised to lower case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Display)]
pub enum CardBrand {
    #[display("pluxee")]
    Pluxee,
    #[display("vr")]
    Vr,
    #[display("alelo")]
    Alelo,
    #[display("ticket")]
    Ticket,
    #[display("{_0}")]
    Other(String),
    #[default]
    #[display("unknown")]
    Unknown,
}

impl CardBrand {
    /// Maps a bureau or host brand name. Sodexo was rebranded as Pluxee.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "" | "unknown" => CardBrand::Unknown,
            "pluxee" | "sodexo" => CardBrand::Pluxee,
            "vr" => CardBrand::Vr,
            "alelo" => CardBrand::Alelo,
            "ticket" => CardBrand::Ticket,
            other => CardBrand::Other(other.to_string()),
        }
    }

    /// Offline detection of the voucher brands by their issuing prefix.
    pub fn from_prefix(digits: &str) -> Option<Self> {
        [
            ("6035", CardBrand::Pluxee),
            ("5070", CardBrand::Vr),
            ("5076", CardBrand::Alelo),
            ("6060", CardBrand::Ticket),
        ]
        .into_iter()
        .find_map(|(prefix, brand)| digits.starts_with(prefix).then_some(brand))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CardBrand::Unknown)
    }

    /// Checks the brand against a merchant's list, an empty list accepts all.
    pub fn is_accepted_by(&self, accepted: &[CardBrand]) -> bool {
        accepted.is_empty() || accepted.contains(self)
    }
}

impl Serialize for CardBrand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CardBrand {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(CardBrand::from_name(&name))
    }
}

/// Raw bureau answer for `GET /bin/v1/{bin}`.
///
/// Every field is optional: the bureau omits what it doesn't know and the
/// grouping/CVV hints are only present for some issuers. Hints are kept raw
/// so a malformed one is dropped without losing the brand.
#[derive(Debug, Default, Deserialize)]
pub struct BinPayload {
    pub bin: Option<String>,
    pub brand: Option<String>,
    pub card_type: Option<String>,
    pub card_sub_type: Option<String>,
    pub issuer: Option<String>,
    pub gaps: Option<serde_json::Value>,
    pub cvv: Option<serde_json::Value>,
}

/// Bureau metadata for the first six digits of a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinProfile {
    pub bin: String,
    pub brand: CardBrand,
    pub card_type: Option<String>,
    pub card_sub_type: Option<String>,
    pub issuer: Option<String>,
    /// Digit-group boundary offsets, strictly increasing.
    pub gaps: Option<Vec<usize>>,
    pub cvv_length: Option<usize>,
}

impl BinProfile {
    pub fn gaps(&self) -> &[usize] {
        self.gaps.as_deref().unwrap_or(consts::DEFAULT_CARD_GAPS)
    }

    pub fn expected_cvv_length(&self) -> usize {
        self.cvv_length.unwrap_or(consts::DEFAULT_CVV_LENGTH)
    }
}

/// Outcome of a BIN lookup. Failures collapse into `Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BinLookup {
    Found(BinProfile),
    Unknown,
}

impl BinLookup {
    /// Validates a decoded payload into a typed lookup result.
    ///
    /// A payload without a usable brand is `Unknown`. Hints that would break
    /// the card-number grouping or the CVV rule are dropped, the rest of the
    /// profile is kept.
    pub fn from_payload(bin: &str, payload: BinPayload) -> Self {
        let brand = CardBrand::from_name(payload.brand.as_deref().unwrap_or_default());
        if brand.is_unknown() {
            return BinLookup::Unknown;
        }

        let gaps = payload
            .gaps
            .and_then(|value| serde_json::from_value::<Vec<usize>>(value).ok())
            .filter(|gaps| {
                !gaps.is_empty()
                    && gaps[0] > 0
                    && gaps.windows(2).all(|pair| pair[0] < pair[1])
                    && gaps.iter().all(|gap| *gap < consts::MAX_CARD_NUMBER_DIGITS)
            });
        let cvv_length = payload
            .cvv
            .and_then(|value| value.as_u64())
            .and_then(|len| usize::try_from(len).ok())
            .filter(|len| (consts::DEFAULT_CVV_LENGTH..=consts::MAX_CVV_LENGTH).contains(len));

        BinLookup::Found(BinProfile {
            bin: payload.bin.unwrap_or_else(|| bin.to_string()),
            brand,
            card_type: payload.card_type.filter(|value| !value.is_empty()),
            card_sub_type: payload.card_sub_type.filter(|value| !value.is_empty()),
            issuer: payload.issuer.filter(|value| !value.is_empty()),
            gaps,
            cvv_length,
        })
    }

    pub fn profile(&self) -> Option<&BinProfile> {
        match self {
            BinLookup::Found(profile) => Some(profile),
            BinLookup::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> BinPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_brand_normalization() {
        assert_eq!(CardBrand::from_name("Sodexo"), CardBrand::Pluxee);
        assert_eq!(CardBrand::from_name("ALELO"), CardBrand::Alelo);
        assert_eq!(CardBrand::from_name(""), CardBrand::Unknown);
        assert_eq!(
            CardBrand::from_name("Elo"),
            CardBrand::Other("elo".to_string())
        );
        assert_eq!(CardBrand::Other("elo".into()).to_string(), "elo");
    }

    #[test]
    fn test_brand_accepted_by_merchant_list() {
        let accepted = [CardBrand::Pluxee, CardBrand::Vr];

        assert!(CardBrand::Vr.is_accepted_by(&accepted));
        assert!(!CardBrand::Alelo.is_accepted_by(&accepted));
        assert!(CardBrand::Alelo.is_accepted_by(&[]));
    }

    #[test]
    fn test_brand_from_prefix() {
        assert_eq!(CardBrand::from_prefix("603512"), Some(CardBrand::Pluxee));
        assert_eq!(CardBrand::from_prefix("5076001"), Some(CardBrand::Alelo));
        assert_eq!(CardBrand::from_prefix("411111"), None);
    }

    #[test]
    fn test_brand_serializes_as_identifier() {
        assert_eq!(serde_json::to_string(&CardBrand::Vr).unwrap(), "\"vr\"");
        assert_eq!(
            serde_json::to_string(&CardBrand::Unknown).unwrap(),
            "\"unknown\""
        );
    }

    #[test]
    fn test_from_payload_full_profile() {
        let lookup = BinLookup::from_payload(
            "603512",
            payload(
                r#"{"bin":"603512","brand":"sodexo","card_type":"voucher",
                "card_sub_type":"alimentacao","issuer":"Sodexo","gaps":[4,8,12],"cvv":3}"#,
            ),
        );

        let profile = lookup.profile().unwrap();
        assert_eq!(profile.brand, CardBrand::Pluxee);
        assert_eq!(profile.card_type.as_deref(), Some("voucher"));
        assert_eq!(profile.gaps(), &[4, 8, 12]);
        assert_eq!(profile.expected_cvv_length(), 3);
    }

    #[test]
    fn test_from_payload_without_brand_is_unknown() {
        let lookup = BinLookup::from_payload("999999", payload(r#"{"card_type":"credit"}"#));
        assert_eq!(lookup, BinLookup::Unknown);

        let lookup = BinLookup::from_payload("999999", payload(r#"{"brand":"unknown"}"#));
        assert_eq!(lookup, BinLookup::Unknown);
    }

    #[test]
    fn test_from_payload_drops_bad_hints() {
        let lookup = BinLookup::from_payload(
            "507001",
            payload(r#"{"brand":"vr","gaps":[8,4],"cvv":7}"#),
        );

        let profile = lookup.profile().unwrap();
        assert_eq!(profile.bin, "507001");
        assert!(profile.gaps.is_none());
        assert_eq!(profile.gaps(), consts::DEFAULT_CARD_GAPS);
        assert_eq!(profile.expected_cvv_length(), consts::DEFAULT_CVV_LENGTH);
    }

    #[test]
    fn test_from_payload_drops_mistyped_hints() {
        let lookup = BinLookup::from_payload(
            "507001",
            payload(r#"{"brand":"vr","gaps":"4,8,12","cvv":"3"}"#),
        );

        let profile = lookup.profile().unwrap();
        assert_eq!(profile.brand, CardBrand::Vr);
        assert!(profile.gaps.is_none());
        assert!(profile.cvv_length.is_none());
    }
}

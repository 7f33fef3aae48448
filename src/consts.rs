use std::time::Duration;

pub const PAGARME_BIN_BASE_URL: &str = "https://api.pagar.me/bin/v1";
pub const PAGARME_TOKENS_URL_PRODUCTION: &str = "https://api.pagar.me/core/v5/tokens";
pub const PAGARME_TOKENS_URL_STAGING: &str = "https://stgapi.mundipagg.com/core/v5/tokens";

pub const BIN_LENGTH: usize = 6;
pub const BIN_LOOKUP_DEBOUNCE: Duration = Duration::from_millis(300);
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_CARD_GAPS: &[usize] = &[4, 8, 12];
pub const MAX_CARD_NUMBER_DIGITS: usize = 19;
pub const MIN_CARD_NUMBER_DIGITS: usize = 13;
pub const DEFAULT_CVV_LENGTH: usize = 3;
pub const MAX_CVV_LENGTH: usize = 4;
pub const CPF_DIGITS: usize = 11;

pub const CHECKOUT_TIMEZONE: chrono_tz::Tz = chrono_tz::America::Sao_Paulo;
pub const DEFAULT_CURRENCY: &str = "BRL";
pub const DEFAULT_CHECKOUT_TITLE: &str = "Vale alimentação ou refeição";

pub const MSG_INVALID_CARD_NUMBER: &str = "Número de cartão inválido";
pub const MSG_HOLDER_NAME_REQUIRED: &str = "Nome obrigatório";
pub const MSG_INVALID_EXPIRY: &str = "Data inválida";
pub const MSG_INVALID_CPF: &str = "CPF inválido";
pub const MSG_BRAND_NOT_ACCEPTED: &str = "Bandeira não aceita";
pub const MSG_TOKENIZATION_FAILED: &str = "Erro ao gerar token";
pub const MSG_PAYMENT_FAILED: &str = "Erro ao processar pagamento. Tente novamente.";

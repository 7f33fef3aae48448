use derive_more::{Display, Error};

/// Failure of a single tokenization attempt.
#[derive(Debug, Display, Error)]
pub enum TokenizationError {
    /// Non-2xx answer, carries the message extracted from the error body.
    #[display("{_0}")]
    Gateway(#[error(not(source))] String),
    #[display("{_0}")]
    Transport(reqwest::Error),
    #[display("resposta inválida do gateway: {_0}")]
    InvalidResponse(#[error(not(source))] String),
}

impl TokenizationError {
    /// Message shown in the checkout banner and sent to the host.
    pub fn user_message(&self) -> String {
        match self {
            TokenizationError::Gateway(msg) if !msg.trim().is_empty() => msg.clone(),
            TokenizationError::Gateway(_) => crate::consts::MSG_PAYMENT_FAILED.to_string(),
            other => other.to_string(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            TokenizationError::Gateway(_) => "gateway",
            TokenizationError::Transport(_) => "transport",
            TokenizationError::InvalidResponse(_) => "invalid_response",
        }
    }

    pub fn get_error_message(&self) -> String {
        format!("[{}] {:#?}", self.kind(), self.to_string())
    }
}

/// Misuse of the host integration surface.
#[derive(Debug, Display, Error)]
pub enum CheckoutError {
    #[display("checkout is not open")]
    NotOpen,
    #[display("gateway public key is missing")]
    MissingPublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let err = TokenizationError::Gateway("Cartão recusado".into());
        assert_eq!(err.user_message(), "Cartão recusado");

        let err = TokenizationError::Gateway(" ".into());
        assert_eq!(err.user_message(), crate::consts::MSG_PAYMENT_FAILED);

        let err = TokenizationError::InvalidResponse("missing id".into());
        assert_eq!(
            err.user_message(),
            "resposta inválida do gateway: missing id"
        );
        assert!(err.get_error_message().starts_with("[invalid_response]"));
    }
}

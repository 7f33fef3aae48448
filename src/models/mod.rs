pub mod bin;
pub mod card;
pub mod checkout;

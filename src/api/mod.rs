//! # API Module
//!
//! Business logic of the checkout form, independent of any gateway transport.
//!
//! ## Modules
//!
//! - [`format`] - Input masks for card number, expiry and CPF
//! - [`session`] - Form session state machine (BIN lookup debounce, submit lifecycle)
//! - [`validation`] - Luhn, expiry and CPF checks

pub mod format;
pub mod session;
pub mod validation;

//! # Voucher Checkout
//!
//! Validation and tokenization core of a meal/food-voucher checkout widget.
//! Card fields are masked and validated locally, the card brand is detected
//! through a debounced BIN bureau lookup, and valid cards are exchanged for a
//! single-use token on the Pagar.me gateway.
//!
//! Hosts drive a [`checkout::VoucherCheckout`] and listen for
//! [`models::checkout::CheckoutEvent`]s.

pub mod api;
pub mod checkout;
pub mod config;
pub mod consts;
pub mod errors;
pub mod logger;
pub mod metric;
pub mod models;
pub mod services;
pub mod utils;

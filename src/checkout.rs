//! # Voucher Checkout
//!
//! Host-facing handle of the checkout modal. Instead of invoking registered
//! callbacks, it delivers [`CheckoutEvent`]s through the receiver returned by
//! [`VoucherCheckout::new`]:
//!
//! - `Success { token, brand }` once per successful submission, the modal closes
//! - `Error { error }` at most once per failed attempt
//! - `Closed` when the host or the user dismisses the modal
//!
//! Each [`open`](VoucherCheckout::open) starts a fresh form session with the
//! given options, replacing any previous one.

use crate::{
    api::session::{CheckoutSession, SessionOptions, SessionUpdate, SubmitOutcome},
    errors::CheckoutError,
    models::checkout::{CheckoutEvent, CheckoutOptions},
    services::{ImplBinLookupService, ImplTokenizationService},
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct VoucherCheckout {
    bin_service: ImplBinLookupService,
    token_service: ImplTokenizationService,
    session_template: SessionOptions,
    options: Option<CheckoutOptions>,
    session: Option<CheckoutSession>,
    events: UnboundedSender<CheckoutEvent>,
}

impl VoucherCheckout {
    pub fn new(
        bin_service: ImplBinLookupService,
        token_service: ImplTokenizationService,
        session_template: SessionOptions,
    ) -> (Self, UnboundedReceiver<CheckoutEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let checkout = Self {
            bin_service,
            token_service,
            session_template,
            options: None,
            session: None,
            events,
        };

        (checkout, receiver)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn options(&self) -> Option<&CheckoutOptions> {
        self.options.as_ref()
    }

    pub fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut CheckoutSession> {
        self.session.as_mut()
    }

    /// Opens the modal with a fresh form session.
    pub fn open(&mut self, options: CheckoutOptions) -> Result<(), CheckoutError> {
        if options.public_key.trim().is_empty() {
            return Err(CheckoutError::MissingPublicKey);
        }

        log::info!(
            "opening checkout: {} {} on {}",
            options.title(),
            options.formatted_amount(),
            options.env
        );

        let session = CheckoutSession::new(
            Arc::clone(&self.bin_service),
            Arc::clone(&self.token_service),
            self.session_template.clone().with_checkout(&options),
        )
        .with_events(self.events.clone());

        self.session = Some(session);
        self.options = Some(options);

        Ok(())
    }

    /// Closes the modal and notifies the host. No-op when already closed.
    ///
    /// A tokenization still in flight runs to completion but its result is
    /// dropped with the session.
    pub fn close(&mut self) {
        if self.session.take().is_none() {
            return;
        }
        self.emit(CheckoutEvent::Closed);
    }

    pub fn submit(&mut self) -> Result<SubmitOutcome, CheckoutError> {
        let session = self.session.as_mut().ok_or(CheckoutError::NotOpen)?;
        Ok(session.submit())
    }

    /// Applies the next session completion, closing the modal after a
    /// successful tokenization.
    pub async fn next_update(&mut self) -> Result<Option<SessionUpdate>, CheckoutError> {
        let session = self.session.as_mut().ok_or(CheckoutError::NotOpen)?;
        let update = session.next_update().await;

        if let Some(SessionUpdate::Tokenized(_)) = &update {
            self.session = None;
        }

        Ok(update)
    }

    /// Applies completions until the session has nothing outstanding.
    pub async fn settle(&mut self) -> Result<Vec<SessionUpdate>, CheckoutError> {
        let mut updates = Vec::new();

        while self
            .session
            .as_ref()
            .is_some_and(CheckoutSession::has_pending_work)
        {
            match self.next_update().await? {
                Some(update) => updates.push(update),
                None => break,
            }
        }

        Ok(updates)
    }

    fn emit(&self, event: CheckoutEvent) {
        if self.events.send(event).is_err() {
            log::warn!("checkout event receiver was dropped");
        }
    }
}

//! # Checkout Form Session
//!
//! State machine behind one open checkout form. It is single threaded and
//! event driven: field edits and submits are synchronous calls, while the
//! two suspending operations (the debounced BIN lookup and the tokenization
//! call) run as spawned tasks that report back through an internal channel.
//! Their completions are applied by [`CheckoutSession::next_update`].
//!
//! ## States
//!
//! - `idle -> validating_bin -> idle` while a BIN lookup is pending
//! - `idle -> processing -> success | error` on submit
//!
//! Only the most recently scheduled BIN lookup may update the profile. Every
//! schedule or cancellation bumps a generation counter and completions carrying
//! an older generation are discarded.
//!
//! Methods that schedule work call [`tokio::spawn`] and must run inside a
//! Tokio runtime.

use crate::{
    api::{format, validation},
    consts,
    errors::TokenizationError,
    metric,
    models::{
        bin::{BinLookup, BinProfile, CardBrand},
        card::{CardField, CardInput, CardTokenRequest, ValidationErrors},
        checkout::{CheckoutEvent, CheckoutOptions, GatewayEnv, SessionStatus, TokenResult},
    },
    services::{ImplBinLookupService, ImplTokenizationService},
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub public_key: String,
    pub env: GatewayEnv,
    /// Brands the merchant accepts, empty accepts all.
    pub accepted_brands: Vec<CardBrand>,
    pub debounce: Duration,
    pub timezone: chrono_tz::Tz,
}

impl SessionOptions {
    /// Takes the gateway and brand settings from the host options, keeping
    /// this template's timing settings.
    pub fn with_checkout(mut self, options: &CheckoutOptions) -> Self {
        self.public_key = options.public_key.clone();
        self.env = options.env;
        self.accepted_brands = options.voucher_brands.clone();
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            env: GatewayEnv::default(),
            accepted_brands: Vec::new(),
            debounce: consts::BIN_LOOKUP_DEBOUNCE,
            timezone: consts::CHECKOUT_TIMEZONE,
        }
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Ignored: a BIN lookup or submission is in flight, the session already
    /// succeeded, or an error banner is showing.
    Blocked,
    /// Field validation failed, nothing was sent to the gateway.
    Rejected(ValidationErrors),
    /// Tokenization is in flight, its result arrives via `next_update`.
    Started,
}

/// A completion applied to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    BinResolved(Option<BinProfile>),
    StaleBinLookupDiscarded,
    Tokenized(TokenResult),
    TokenizationFailed(String),
}

#[derive(Debug)]
enum SessionEvent {
    BinResolved {
        generation: u64,
        bin: String,
        lookup: BinLookup,
    },
    TokenResolved(Result<String, TokenizationError>),
}

struct PendingLookup {
    bin: String,
    handle: JoinHandle<()>,
}

pub struct CheckoutSession {
    input: CardInput,
    status: SessionStatus,
    errors: ValidationErrors,
    global_error: Option<String>,
    bin_error: Option<String>,
    bin_profile: Option<BinProfile>,
    detected_brand: Option<CardBrand>,
    /// BIN the current profile (or its absence) was resolved for.
    resolved_bin: Option<String>,
    lookup_generation: u64,
    pending_lookup: Option<PendingLookup>,
    options: SessionOptions,
    bin_service: ImplBinLookupService,
    token_service: ImplTokenizationService,
    events: Option<UnboundedSender<CheckoutEvent>>,
    tx: UnboundedSender<SessionEvent>,
    rx: UnboundedReceiver<SessionEvent>,
}

impl CheckoutSession {
    pub fn new(
        bin_service: ImplBinLookupService,
        token_service: ImplTokenizationService,
        options: SessionOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            input: CardInput::default(),
            status: SessionStatus::Idle,
            errors: ValidationErrors::new(),
            global_error: None,
            bin_error: None,
            bin_profile: None,
            detected_brand: None,
            resolved_bin: None,
            lookup_generation: 0,
            pending_lookup: None,
            options,
            bin_service,
            token_service,
            events: None,
            tx,
            rx,
        }
    }

    /// Publishes success and error notifications to the host.
    pub fn with_events(mut self, events: UnboundedSender<CheckoutEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn input(&self) -> &CardInput {
        &self.input
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn global_error(&self) -> Option<&str> {
        self.global_error.as_deref()
    }

    pub fn bin_error(&self) -> Option<&str> {
        self.bin_error.as_deref()
    }

    pub fn bin_profile(&self) -> Option<&BinProfile> {
        self.bin_profile.as_ref()
    }

    pub fn detected_brand(&self) -> Option<&CardBrand> {
        self.detected_brand.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Inputs lock while tokenizing and for good after a success.
    pub fn is_editable(&self) -> bool {
        !matches!(
            self.status,
            SessionStatus::Processing | SessionStatus::Success
        )
    }

    /// Whether the submit control is enabled.
    ///
    /// Disabled until the pending BIN lookup lands, so the brand check and
    /// the CVV rule always see the card's profile.
    pub fn can_submit(&self) -> bool {
        self.is_editable()
            && self.pending_lookup.is_none()
            && self.global_error.is_none()
            && self.bin_error.is_none()
    }

    /// True while a BIN lookup or tokenization result is outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.pending_lookup.is_some() || self.status == SessionStatus::Processing
    }

    /// Number of CVV digits the current card requires.
    pub fn expected_cvv_length(&self) -> usize {
        self.bin_profile
            .as_ref()
            .map_or(consts::DEFAULT_CVV_LENGTH, BinProfile::expected_cvv_length)
    }

    fn cvv_capacity(&self) -> usize {
        self.bin_profile
            .as_ref()
            .and_then(|profile| profile.cvv_length)
            .unwrap_or(consts::MAX_CVV_LENGTH)
    }

    fn card_gaps(&self) -> &[usize] {
        self.bin_profile
            .as_ref()
            .map_or(consts::DEFAULT_CARD_GAPS, BinProfile::gaps)
    }

    /// Brand reported with the token: detected, else profile, else unknown.
    pub fn resolved_brand(&self) -> CardBrand {
        self.detected_brand
            .clone()
            .or_else(|| self.bin_profile.as_ref().map(|profile| profile.brand.clone()))
            .unwrap_or_default()
    }

    /// Applies a user edit. Returns `false` when inputs are locked.
    ///
    /// The field's validation message is cleared, the global banner is not.
    pub fn update_field(&mut self, field: CardField, raw: &str) -> bool {
        if !self.is_editable() {
            return false;
        }

        let value = match field {
            CardField::Number => {
                let digits: String = format::only_digits(raw)
                    .chars()
                    .take(consts::MAX_CARD_NUMBER_DIGITS)
                    .collect();
                format::format_card_number(&digits, self.card_gaps())
            }
            CardField::HolderName => raw.to_string(),
            CardField::Expiry => format::format_expiry(raw),
            CardField::Cvv => format::format_cvv(raw, self.cvv_capacity()),
            CardField::TaxId => format::format_cpf(raw),
        };

        self.input.set(field, value);
        self.errors.remove(&field);

        if field == CardField::Number {
            self.on_card_number_changed();
        }

        true
    }

    fn on_card_number_changed(&mut self) {
        let digits = self.input.number_digits();

        if digits.len() < consts::BIN_LENGTH {
            self.cancel_pending_lookup();
            self.clear_bin_state();
            if self.status == SessionStatus::ValidatingBin {
                self.status = SessionStatus::Idle;
            }
            return;
        }

        let bin = &digits[..consts::BIN_LENGTH];
        let already_resolved = self.pending_lookup.is_none()
            && self.resolved_bin.as_deref() == Some(bin);
        if already_resolved {
            return;
        }

        let pending_same_bin = self
            .pending_lookup
            .as_ref()
            .is_some_and(|pending| pending.bin == bin);
        if !pending_same_bin && self.resolved_bin.as_deref() != Some(bin) {
            self.clear_bin_state();
        }

        self.schedule_lookup(bin.to_string());
    }

    fn clear_bin_state(&mut self) {
        self.bin_profile = None;
        self.detected_brand = None;
        self.bin_error = None;
        self.resolved_bin = None;
    }

    /// Drops the pending lookup, if any, and invalidates its completion.
    fn cancel_pending_lookup(&mut self) {
        self.lookup_generation += 1;
        if let Some(pending) = self.pending_lookup.take() {
            log::debug!("cancelling BIN lookup for {}", pending.bin);
            pending.handle.abort();
        }
    }

    fn schedule_lookup(&mut self, bin: String) {
        self.cancel_pending_lookup();

        let generation = self.lookup_generation;
        let service = Arc::clone(&self.bin_service);
        let tx = self.tx.clone();
        let quiet_period = self.options.debounce;
        let task_bin = bin.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let lookup = service.lookup_bin(&task_bin).await;
            let _ = tx.send(SessionEvent::BinResolved {
                generation,
                bin: task_bin,
                lookup,
            });
        });

        self.pending_lookup = Some(PendingLookup { bin, handle });
        if self.status == SessionStatus::Idle {
            self.status = SessionStatus::ValidatingBin;
        }
    }

    /// Recomputes every field error from the current input.
    pub fn validate(&mut self) -> &ValidationErrors {
        self.errors = validation::validate_card_input(
            &self.input,
            self.expected_cvv_length(),
            self.options.timezone,
        );
        &self.errors
    }

    /// Validates and, if everything passes, starts the tokenization call.
    pub fn submit(&mut self) -> SubmitOutcome {
        if !self.can_submit() {
            log::debug!("submit ignored while {}", self.status);
            return SubmitOutcome::Blocked;
        }

        if !self.validate().is_empty() {
            metric::incr_submit_statds("rejected");
            return SubmitOutcome::Rejected(self.errors.clone());
        }

        let Some(request) = CardTokenRequest::from_input(&self.input) else {
            self.errors
                .insert(CardField::Expiry, consts::MSG_INVALID_EXPIRY.into());
            return SubmitOutcome::Rejected(self.errors.clone());
        };

        self.status = SessionStatus::Processing;
        self.global_error = None;
        metric::incr_submit_statds("started");

        let service = Arc::clone(&self.token_service);
        let tx = self.tx.clone();
        let public_key = self.options.public_key.clone();
        let env = self.options.env;

        tokio::spawn(async move {
            let result = service.create_card_token(&request, &public_key, env).await;
            let _ = tx.send(SessionEvent::TokenResolved(result));
        });

        SubmitOutcome::Started
    }

    /// Clears the error banner so the form can be submitted again.
    pub fn dismiss_error(&mut self) {
        self.global_error = None;
        if self.status == SessionStatus::Error {
            self.status = SessionStatus::Idle;
        }
    }

    /// Waits for the next completion and applies it.
    ///
    /// Waits forever when nothing is pending, check
    /// [`has_pending_work`](Self::has_pending_work) first.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let event = self.rx.recv().await?;
        Some(self.apply(event))
    }

    /// Applies completions until no lookup or tokenization is outstanding.
    pub async fn settle(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while self.has_pending_work() {
            match self.next_update().await {
                Some(update) => updates.push(update),
                None => break,
            }
        }
        updates
    }

    fn apply(&mut self, event: SessionEvent) -> SessionUpdate {
        match event {
            SessionEvent::BinResolved {
                generation,
                bin,
                lookup,
            } => self.apply_bin_lookup(generation, bin, lookup),
            SessionEvent::TokenResolved(result) => self.apply_token_result(result),
        }
    }

    fn apply_bin_lookup(&mut self, generation: u64, bin: String, lookup: BinLookup) -> SessionUpdate {
        if generation != self.lookup_generation {
            log::debug!("discarding stale BIN lookup for {bin}");
            return SessionUpdate::StaleBinLookupDiscarded;
        }

        self.pending_lookup = None;
        if self.status == SessionStatus::ValidatingBin {
            self.status = SessionStatus::Idle;
        }

        match lookup {
            BinLookup::Found(profile) => {
                self.detected_brand = Some(profile.brand.clone());
                self.bin_profile = Some(profile);
            }
            BinLookup::Unknown => {
                self.bin_profile = None;
                self.detected_brand = CardBrand::from_prefix(&bin);
            }
        }
        self.resolved_bin = Some(bin);

        self.bin_error = self
            .detected_brand
            .as_ref()
            .filter(|brand| !brand.is_accepted_by(&self.options.accepted_brands))
            .map(|brand| format!("{}: {brand}", consts::MSG_BRAND_NOT_ACCEPTED));

        // Regroup and trim with the new hints.
        self.input.number = format::format_card_number(&self.input.number, self.card_gaps());
        self.input.cvv = format::format_cvv(&self.input.cvv, self.cvv_capacity());

        SessionUpdate::BinResolved(self.bin_profile.clone())
    }

    fn apply_token_result(&mut self, result: Result<String, TokenizationError>) -> SessionUpdate {
        match result {
            Ok(token) => {
                self.status = SessionStatus::Success;
                let token_result = TokenResult {
                    token,
                    brand: self.resolved_brand(),
                };
                metric::incr_submit_statds("success");
                self.publish(CheckoutEvent::from(token_result.clone()));

                SessionUpdate::Tokenized(token_result)
            }
            Err(e) => {
                log::error!("tokenization failed: {}", e.get_error_message());
                let message = e.user_message();

                self.status = SessionStatus::Error;
                self.global_error = Some(message.clone());
                metric::incr_submit_statds("error");
                self.publish(CheckoutEvent::Error {
                    error: message.clone(),
                });

                SessionUpdate::TokenizationFailed(message)
            }
        }
    }

    fn publish(&self, event: CheckoutEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                log::warn!("checkout event receiver was dropped");
            }
        }
    }
}

impl Drop for CheckoutSession {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_lookup.take() {
            pending.handle.abort();
        }
    }
}

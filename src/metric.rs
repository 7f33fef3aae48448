use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("voucher_checkout_statds")
        .with_description("Voucher checkout statistics")
        .with_unit("attempt")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_bin_lookup_statds(outcome: &str) {
    incr_statds("bin_lookup".to_string(), outcome.into())
}

pub fn incr_tokenization_statds(outcome: &str) {
    incr_statds("tokenization".to_string(), outcome.into())
}

pub fn incr_submit_statds(outcome: &str) {
    incr_statds("submit".to_string(), outcome.into())
}

//! Metrics collection for observability

use prometheus::{
    Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_with_registry,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::warn;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Chat lifecycle metrics
    pub chats_created: Counter,
    pub chats_ended: Counter,
    pub create_failures: CounterVec,

    // Message metrics
    pub messages_appended: CounterVec,
    pub messages_evicted: Counter,
    pub append_rejections: CounterVec,

    // Token budget metrics
    pub token_usage: Histogram,
    pub token_remaining: Histogram,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let chats_created = register_counter_with_registry!(
            Opts::new("chats_created_total", "Total chats created"),
            registry
        )?;

        let chats_ended = register_counter_with_registry!(
            Opts::new("chats_ended_total", "Total chats ended"),
            registry
        )?;

        let create_failures = register_counter_vec_with_registry!(
            Opts::new("chat_create_failures_total", "Total chats that failed to be created"),
            &["reason"],
            registry
        )?;

        let messages_appended = register_counter_vec_with_registry!(
            Opts::new("chat_messages_appended_total", "Total messages appended to chats"),
            &["role"],
            registry
        )?;

        let messages_evicted = register_counter_with_registry!(
            Opts::new("chat_messages_evicted_total", "Total messages evicted from chat windows"),
            registry
        )?;

        let append_rejections = register_counter_vec_with_registry!(
            Opts::new("chat_append_rejections_total", "Total rejected message appends"),
            &["reason"],
            registry
        )?;

        let token_usage = register_histogram_with_registry!(
            "chat_token_usage",
            "Active tokens in a chat after each append",
            registry
        )?;

        let token_remaining = register_histogram_with_registry!(
            "chat_token_remaining",
            "Tokens left in the context window after each append",
            registry
        )?;

        Ok(Self {
            registry,
            chats_created,
            chats_ended,
            create_failures,
            messages_appended,
            messages_evicted,
            append_rejections,
            token_usage,
            token_remaining,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a successful append
    pub fn record_append(&self, role: &str, evicted: usize, used: usize, remaining: usize) {
        self.messages_appended.with_label_values(&[role]).inc();
        if evicted > 0 {
            self.messages_evicted.inc_by(evicted as f64);
        }
        self.token_usage.observe(used as f64);
        self.token_remaining.observe(remaining as f64);
    }

    /// Record a rejected append
    pub fn record_rejection(&self, reason: &str) {
        self.append_rejections.with_label_values(&[reason]).inc();
    }

    pub fn record_chat_created(&self) {
        self.chats_created.inc();
    }

    /// Record a chat that could not be created
    pub fn record_create_failure(&self, reason: &str) {
        self.create_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_chat_ended(&self) {
        self.chats_ended.inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!("Failed to encode metrics: {}", e);
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

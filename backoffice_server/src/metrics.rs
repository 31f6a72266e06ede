//! Prometheus metrics for back-office observability.

use metrics::counter;

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record the outcome of a content or lead mutation.
pub fn mutation_recorded(collection: &str, outcome: &'static str) {
    counter!(
        "site_mutations_total",
        "collection" => collection.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record where a slug came from ("generator" or "fallback").
pub fn slug_derived(source: &'static str) {
    counter!("site_slug_derivations_total", "source" => source).increment(1);
}

/// Record a revalidation attempt against the public site.
pub fn revalidation_sent(outcome: &'static str) {
    counter!("site_revalidations_total", "outcome" => outcome).increment(1);
}

/// Record an admin login attempt.
pub fn login_attempted(outcome: &'static str) {
    counter!("site_admin_logins_total", "outcome" => outcome).increment(1);
}

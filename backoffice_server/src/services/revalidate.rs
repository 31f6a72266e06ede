//! Public-site cache revalidation — fire-and-forget notifications.
//!
//! After a write, every public path that may show the changed item is sent
//! to `{client_url}/api/revalidate`. Failures are only logged; the mutation
//! that triggered them has already succeeded.

use serde_json::json;
use tokio::task::JoinHandle;

use crate::config::SiteConfig;

pub const SECRET_HEADER: &str = "x-revalidation-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationOutcome {
    Revalidated,
    Rejected(u16),
    Failed,
    Skipped,
}

#[derive(Clone)]
struct Target {
    endpoint: String,
    secret: String,
}

#[derive(Clone)]
pub struct RevalidationNotifier {
    client: reqwest::Client,
    target: Option<Target>,
}

impl RevalidationNotifier {
    pub fn new(client: reqwest::Client, client_url: Option<&str>, secret: Option<&str>) -> Self {
        let target = match (client_url, secret) {
            (Some(url), Some(secret)) => Some(Target {
                endpoint: format!("{}/api/revalidate", url.trim_end_matches('/')),
                secret: secret.to_string(),
            }),
            _ => None,
        };
        Self { client, target }
    }

    pub fn from_config(config: &SiteConfig, client: reqwest::Client) -> Self {
        Self::new(
            client,
            config.client_url.as_deref(),
            config.revalidation_secret.as_deref(),
        )
    }

    /// Notifier that only logs.
    pub fn disabled() -> Self {
        Self::new(reqwest::Client::new(), None, None)
    }

    /// Ask the public site to drop its cached rendering of `path`.
    pub async fn revalidate(&self, path: &str) -> RevalidationOutcome {
        let Some(target) = &self.target else {
            tracing::debug!(path, "Revalidation target not configured, skipping");
            crate::metrics::revalidation_sent("skipped");
            return RevalidationOutcome::Skipped;
        };

        let result = self
            .client
            .post(&target.endpoint)
            .header(SECRET_HEADER, &target.secret)
            .json(&json!({ "path": path }))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(path, "Revalidated public path");
                crate::metrics::revalidation_sent("ok");
                RevalidationOutcome::Revalidated
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                tracing::warn!(path, status, body = %body, "Public site rejected revalidation");
                crate::metrics::revalidation_sent("rejected");
                RevalidationOutcome::Rejected(status)
            }
            Err(e) => {
                tracing::error!(path, error = %e, "Revalidation request failed");
                crate::metrics::revalidation_sent("error");
                RevalidationOutcome::Failed
            }
        }
    }

    /// Fire one detached task per path. Dropping the handles leaves the tasks
    /// running; there is no ordering between them.
    pub fn spawn(&self, paths: Vec<String>) -> Vec<JoinHandle<RevalidationOutcome>> {
        paths
            .into_iter()
            .map(|path| {
                let notifier = self.clone();
                tokio::spawn(async move { notifier.revalidate(&path).await })
            })
            .collect()
    }
}

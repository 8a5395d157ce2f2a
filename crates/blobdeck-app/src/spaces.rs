use anyhow::{Context, Result};
use blobdeck_core::format::format_bytes;
use blobdeck_core::store::{RateLimit, Space};

use crate::App;
use crate::prompt::require_input;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReport {
    pub space: Space,
    pub bytes: u64,
}

impl UsageReport {
    pub fn line(&self) -> String {
        format!(
            "Usage for {} ({}): {}",
            self.space.name.as_deref().unwrap_or("(no name)"),
            self.space.did,
            format_bytes(Some(self.bytes))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitReport {
    pub subject: String,
    /// Provider the answer came from; `None` when the unscoped query was used.
    pub provider: Option<String>,
    pub limits: Vec<RateLimit>,
}

impl RateLimitReport {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Subject: {}", self.subject),
            format!("Provider: {}", self.provider.as_deref().unwrap_or("(any)")),
            String::new(),
        ];
        if self.limits.is_empty() {
            lines.push("(none)".to_string());
        } else {
            lines.extend(
                self.limits
                    .iter()
                    .map(|limit| format!("- id={} rate={}", limit.id, limit.limit)),
            );
        }
        lines
    }
}

impl App {
    pub fn list_spaces(&self) -> Result<Vec<Space>> {
        self.store.spaces().context("failed to list spaces")
    }

    pub fn space_lines(&self) -> Result<Vec<String>> {
        let spaces = self.list_spaces()?;
        if spaces.is_empty() {
            return Ok(vec!["No spaces known to this agent.".to_string()]);
        }
        Ok(spaces
            .iter()
            .map(|space| {
                format!(
                    "{}  {}  [{}]",
                    space.name.as_deref().unwrap_or("(no name)"),
                    space.did,
                    space.access_label()
                )
            })
            .collect())
    }

    pub fn usage(&self, space: &Space) -> Result<UsageReport> {
        let bytes = self
            .store
            .usage(&space.did)
            .with_context(|| format!("Usage error for {}", space.did))?;
        Ok(UsageReport {
            space: space.clone(),
            bytes,
        })
    }

    /// Queries with `provider` first and once more without it if that fails.
    pub fn rate_limits(&self, subject: &str, provider: Option<&str>) -> Result<RateLimitReport> {
        let subject = require_input("subject", subject)?;
        let provider = provider
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(provider) = provider {
            match self.store.rate_limits(&subject, Some(provider)) {
                Ok(limits) => {
                    return Ok(RateLimitReport {
                        subject,
                        provider: Some(provider.to_string()),
                        limits,
                    });
                }
                Err(error) => {
                    tracing::warn!(%provider, %error, "rate limit query with provider failed, retrying without");
                }
            }
        }

        let limits = self
            .store
            .rate_limits(&subject, None)
            .with_context(|| format!("failed to list rate limits for {subject}"))?;
        Ok(RateLimitReport {
            subject,
            provider: None,
            limits,
        })
    }
}

// src/telemetry.rs
//! Logging and metrics bootstrap for binaries embedding the novelty core.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG: &str = "NOVELTY_LOG";
pub const ENV_LOG_FORMAT: &str = "NOVELTY_LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// Filter comes from `NOVELTY_LOG` (falls back to `story_novelty=info,warn`);
/// `NOVELTY_LOG_FORMAT=json` switches to JSON lines. A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new("story_novelty=info,novelty=info,intake=info,warn"));

    let json = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };

    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register metric descriptions.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        crate::intake::ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

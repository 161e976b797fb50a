//! Listening stats delivery
//!
//! Reports are fire-and-forget: failures are logged, never retried, and never
//! block playback.

use crate::error::Result;
use crate::types::ListeningReport;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// Receives one report per flush
pub trait StatsReporter {
    fn report(&self, report: ListeningReport) -> Result<()>;
}

/// Writes reports to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatsReporter for LogReporter {
    fn report(&self, report: ListeningReport) -> Result<()> {
        info!(
            track_id = %report.track_id,
            ranges = ?report.ranges,
            "Listening stats"
        );
        Ok(())
    }
}

/// Keeps every report in memory
///
/// Clones share the same list, so a test or the CLI can keep one clone while
/// the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    reports: Rc<RefCell<Vec<ListeningReport>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ListeningReport> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn take(&self) -> Vec<ListeningReport> {
        std::mem::take(&mut *self.reports.borrow_mut())
    }
}

impl StatsReporter for MemoryReporter {
    fn report(&self, report: ListeningReport) -> Result<()> {
        self.reports.borrow_mut().push(report);
        Ok(())
    }
}

#[cfg(feature = "http")]
pub use http::HttpStatsReporter;

#[cfg(feature = "http")]
mod http {
    use super::StatsReporter;
    use crate::error::{PlaybackError, Result};
    use crate::types::ListeningReport;
    use reqwest::Client;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::runtime::Handle;
    use tokio::task::JoinHandle;
    use tracing::{debug, warn};

    /// Posts reports to `{base}/tracks/{id}/stats`
    ///
    /// Each report is sent on its own task on the given runtime; `report`
    /// returns as soon as the task is spawned.
    #[derive(Debug, Clone)]
    pub struct HttpStatsReporter {
        http: Client,
        base_url: String,
        token: Option<String>,
        runtime: Handle,
        pending: Rc<RefCell<Vec<JoinHandle<()>>>>,
    }

    impl HttpStatsReporter {
        pub fn new(base_url: &str, runtime: Handle) -> Result<Self> {
            let base_url = base_url.trim_end_matches('/').to_string();
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(PlaybackError::Config(format!(
                    "stats base URL must be absolute, got {base_url:?}"
                )));
            }

            let http = Client::builder()
                .timeout(Duration::from_secs(10))
                .connect_timeout(Duration::from_secs(5))
                .user_agent(format!("OrpheonPlayer/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| PlaybackError::reporting(e.to_string()))?;

            Ok(Self {
                http,
                base_url,
                token: None,
                runtime,
                pending: Rc::new(RefCell::new(Vec::new())),
            })
        }

        /// Send `Authorization: Bearer <token>` with every report
        #[must_use]
        pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
            self.token = Some(token.into());
            self
        }

        pub fn endpoint(&self, report: &ListeningReport) -> String {
            format!("{}/tracks/{}/stats", self.base_url, report.track_id)
        }

        /// Hand over the in-flight deliveries so the caller can await them
        pub fn take_pending(&self) -> Vec<JoinHandle<()>> {
            std::mem::take(&mut *self.pending.borrow_mut())
        }
    }

    impl StatsReporter for HttpStatsReporter {
        fn report(&self, report: ListeningReport) -> Result<()> {
            let url = self.endpoint(&report);
            let mut request = self.http.post(&url).json(&report);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let handle = self.runtime.spawn(async move {
                debug!(url = %url, "Sending listening stats");
                match request.send().await {
                    Ok(response) if response.status().is_success() => {
                        debug!(url = %url, status = %response.status(), "Listening stats accepted");
                    }
                    Ok(response) => {
                        warn!(url = %url, status = %response.status(), "Listening stats rejected");
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to send listening stats");
                    }
                }
            });

            let mut pending = self.pending.borrow_mut();
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
            Ok(())
        }
    }
}

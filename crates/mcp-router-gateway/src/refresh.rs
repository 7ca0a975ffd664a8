//! Periodic catalog refresh.
//!
//! Lists tools on both backends concurrently and publishes a new snapshot.
//! A backend that fails to list keeps its previous entries; refresh errors
//! are logged and never stop the loop.

use std::sync::Arc;
use std::time::Duration;

use mcp_router_core::{BackendId, Catalog, ClientError, ClientResult, ToolMap};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::gateway::FailoverGateway;

/// Period between catalog refreshes
pub const CATALOG_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Per-backend result of one refresh round: tool count or the listing error
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub official: Result<usize, ClientError>,
    pub custom: Result<usize, ClientError>,
}

impl RefreshReport {
    /// Result for one backend
    pub fn get(&self, backend: BackendId) -> &Result<usize, ClientError> {
        match backend {
            BackendId::Official => &self.official,
            BackendId::Custom => &self.custom,
        }
    }

    pub fn both_failed(&self) -> bool {
        self.official.is_err() && self.custom.is_err()
    }
}

impl FailoverGateway {
    /// Run one refresh round and publish the resulting snapshot.
    ///
    /// Both listings are requested concurrently. Each successful listing
    /// replaces that backend's half of the catalog; a failed one leaves the
    /// previous half in place.
    pub async fn refresh_catalog(&self) -> (RefreshReport, Arc<Catalog>) {
        let (official, custom) = tokio::join!(
            self.backend(BackendId::Official).list_tools(),
            self.backend(BackendId::Custom).list_tools(),
        );

        let report = RefreshReport {
            official: count(&official),
            custom: count(&custom),
        };
        let snapshot = self.catalog().apply(official.ok(), custom.ok());

        for backend in BackendId::ALL {
            match report.get(backend) {
                Ok(n) => debug!(backend = %backend, tools = n, "Catalog listing refreshed"),
                Err(e) if !report.both_failed() => {
                    warn!(backend = %backend, error = %e, "Catalog refresh failed, keeping previous listing")
                }
                Err(_) => {}
            }
        }
        if report.both_failed() {
            error!(
                official_error = ?report.official.as_ref().err(),
                custom_error = ?report.custom.as_ref().err(),
                "Catalog refresh failed on both backends"
            );
        }

        (report, snapshot)
    }
}

fn count(result: &ClientResult<ToolMap>) -> Result<usize, ClientError> {
    result.as_ref().map(|tools| tools.len()).map_err(Clone::clone)
}

/// Spawn the background refresh loop.
///
/// The first round runs immediately, then every `period`. `on_refresh` is
/// invoked after each round with the report and the published snapshot.
/// Abort the returned handle to stop the loop.
pub fn spawn_catalog_refresh<F>(
    gateway: Arc<FailoverGateway>,
    period: Duration,
    on_refresh: F,
) -> JoinHandle<()>
where
    F: Fn(&RefreshReport, &Catalog) + Send + Sync + 'static,
{
    info!(period_secs = period.as_secs(), "Starting catalog refresh loop");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let (report, snapshot) = gateway.refresh_catalog().await;
            on_refresh(&report, &snapshot);
        }
    })
}

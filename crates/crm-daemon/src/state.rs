//! Shared runtime state for crm-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. All persistent data is
//! behind the injected [`Store`]; this module owns only the event bus and
//! static settings.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use crm_config::CrmConfig;
use crm_db::Store;
use crm_schemas::DashboardPolicy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    Promoted,
}

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    EntityChanged {
        entity: String,
        id: i64,
        action: ChangeAction,
    },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub store: Arc<dyn Store>,
    pub dashboard: DashboardPolicy,
    /// Business time zone; decides which schedules are "today".
    pub timezone: Tz,
}

impl AppState {
    /// State with default dashboard settings (UTC).
    pub fn new(store: Arc<dyn Store>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            bus,
            build: BuildInfo {
                service: "crm-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            store,
            dashboard: DashboardPolicy::default(),
            timezone: Tz::UTC,
        }
    }

    pub fn from_config(store: Arc<dyn Store>, cfg: &CrmConfig) -> anyhow::Result<Self> {
        let mut st = Self::new(store);
        st.dashboard = DashboardPolicy {
            low_stock_threshold: cfg.dashboard.low_stock_threshold,
            recent_limit: cfg.dashboard.recent_limit,
        };
        st.timezone = cfg.dashboard.tz()?;
        Ok(st)
    }

    /// Current calendar date in the business time zone.
    pub fn today(&self) -> NaiveDate {
        chrono::Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// Announce a successful write. No subscribers is not an error.
    pub fn publish(&self, entity: &str, id: i64, action: ChangeAction) {
        let _ = self.bus.send(BusMsg::EntityChanged {
            entity: entity.to_string(),
            id,
            action,
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

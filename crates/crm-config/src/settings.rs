use std::net::SocketAddr;

use anyhow::{anyhow, bail, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Comma-separated YAML paths in merge order.
pub const ENV_CONFIG_PATHS: &str = "CRM_CONFIG";
/// Overrides `server.bind_addr`.
pub const ENV_DAEMON_ADDR: &str = "CRM_DAEMON_ADDR";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Interval between SSE heartbeats on /api/stream.
    pub heartbeat_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
            heartbeat_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Name of the environment variable holding the connection string.
    pub database_url_env: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database_url_env: "CRM_DATABASE_URL".to_string(),
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub low_stock_threshold: i32,
    pub recent_limit: usize,
    /// IANA zone used to decide which schedules are "today".
    pub timezone: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            recent_limit: 5,
            timezone: "UTC".to_string(),
        }
    }
}

impl DashboardSettings {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("dashboard.timezone {:?}: {e}", self.timezone))
    }
}

impl CrmConfig {
    /// Semantic checks serde cannot express.
    pub fn check(&self) -> Result<()> {
        self.server.socket_addr()?;
        if self.server.heartbeat_secs == 0 {
            bail!("server.heartbeat_secs must be > 0");
        }
        if self.storage.max_connections == 0 {
            bail!("storage.max_connections must be > 0");
        }
        if self.storage.database_url_env.trim().is_empty() {
            bail!("storage.database_url_env must name an environment variable");
        }
        if self.dashboard.low_stock_threshold < 0 {
            bail!("dashboard.low_stock_threshold must be >= 0");
        }
        self.dashboard.tz()?;
        Ok(())
    }

    /// A blank override leaves the configured address in place.
    pub(crate) fn override_bind_addr(&mut self, addr: Option<&str>) {
        if let Some(addr) = addr.map(str::trim).filter(|a| !a.is_empty()) {
            self.server.bind_addr = addr.to_string();
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| anyhow!("server.bind_addr {:?}: {e}", self.bind_addr))
    }
}

use serde::Deserialize;
use watchpost_core::error::{Result, WatchpostError};
use watchpost_core::protocol::requests::DEFAULT_ROLE;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub dispatch: DispatchSection,

    #[serde(default)]
    pub dedup: DedupSection,

    #[serde(default)]
    pub transport: TransportSection,
}

impl ConsoleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WatchpostError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.dispatch.validate()?;
        self.dedup.validate()?;

        Ok(())
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            dispatch: DispatchSection::default(),
            dedup: DedupSection::default(),
            transport: TransportSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Identity announced in the HELLO handshake.
    #[serde(default = "default_role")]
    pub role: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            role: default_role(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(WatchpostError::BadRequest("server.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(WatchpostError::BadRequest("server.port must not be 0".into()));
        }
        if self.role.trim().is_empty() {
            return Err(WatchpostError::BadRequest("server.role must not be empty".into()));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5050
}
fn default_role() -> String {
    DEFAULT_ROLE.into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    /// Messages routed per wake-up before yielding.
    #[serde(default = "default_budget")]
    pub budget: usize,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            budget: default_budget(),
        }
    }
}

impl DispatchSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.budget) {
            return Err(WatchpostError::BadRequest(
                "dispatch.budget must be between 1 and 10000".into(),
            ));
        }
        Ok(())
    }
}

fn default_budget() -> usize {
    200
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DedupSection {
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,

    #[serde(default = "default_fire_cooldown_ms")]
    pub fire_cooldown_ms: i64,

    /// 0 = never sweep.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for DedupSection {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            fire_cooldown_ms: default_fire_cooldown_ms(),
            max_entries: default_max_entries(),
        }
    }
}

impl DedupSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=600_000).contains(&self.window_ms) {
            return Err(WatchpostError::BadRequest(
                "dedup.window_ms must be between 1 and 600000".into(),
            ));
        }
        if self.fire_cooldown_ms < self.window_ms {
            return Err(WatchpostError::BadRequest(
                "dedup.fire_cooldown_ms must not be shorter than window_ms".into(),
            ));
        }
        if self.max_entries != 0 && self.max_entries < 64 {
            return Err(WatchpostError::BadRequest(
                "dedup.max_entries must be 0 (unbounded) or at least 64".into(),
            ));
        }
        Ok(())
    }
}

fn default_window_ms() -> i64 {
    3000
}
fn default_fire_cooldown_ms() -> i64 {
    20_000
}
fn default_max_entries() -> usize {
    4096
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    /// Cap on a buffered partial line; 0 = unbounded.
    #[serde(default)]
    pub max_line_bytes: usize,
}

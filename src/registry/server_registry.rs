//! SQLite-backed registry of installed and running MCP servers

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::types::RegistrySnapshot;

/// Simulated provisioning latency for each lifecycle step
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionTiming {
    pub install: Duration,
    pub start: Duration,
    pub stop: Duration,
}

impl ProvisionTiming {
    /// No simulated latency
    pub fn instant() -> Self {
        Self::default()
    }
}

impl From<&RegistryConfig> for ProvisionTiming {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            install: Duration::from_millis(config.install_delay_ms),
            start: Duration::from_millis(config.start_delay_ms),
            stop: Duration::from_millis(config.stop_delay_ms),
        }
    }
}

/// Row state of a server id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Absent,
    Installed,
    Running,
}

/// Registry of MCP servers.
///
/// Every transition is a single conditional statement, so two requests racing
/// on the same id cannot both succeed. The lock is never held across the
/// simulated provisioning delay.
pub struct ServerRegistry {
    conn: Mutex<Connection>,
    timing: ProvisionTiming,
}

impl ServerRegistry {
    /// Open or create the registry database
    pub fn open(path: &Path, timing: ProvisionTiming) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?, timing)
    }

    /// Registry that lives only as long as the process
    pub fn open_in_memory(timing: ProvisionTiming) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, timing)
    }

    fn from_connection(conn: Connection, timing: ProvisionTiming) -> Result<Self> {
        let registry = Self {
            conn: Mutex::new(conn),
            timing,
        };
        registry.init_schema()?;
        Ok(registry)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS servers (
                id TEXT PRIMARY KEY,
                installed_at TEXT NOT NULL,
                running INTEGER NOT NULL DEFAULT 0,
                started_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_servers_installed ON servers(installed_at);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("registry lock poisoned".into()))
    }

    fn state_of(&self, server_id: &str) -> Result<ServerState> {
        let conn = self.lock()?;
        let running: Option<bool> = conn
            .query_row(
                "SELECT running FROM servers WHERE id = ?1",
                params![server_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match running {
            None => ServerState::Absent,
            Some(false) => ServerState::Installed,
            Some(true) => ServerState::Running,
        })
    }

    pub fn is_installed(&self, server_id: &str) -> Result<bool> {
        Ok(self.state_of(server_id)? != ServerState::Absent)
    }

    pub fn is_running(&self, server_id: &str) -> Result<bool> {
        Ok(self.state_of(server_id)? == ServerState::Running)
    }

    /// Install a server
    pub async fn install(&self, server_id: &str) -> Result<()> {
        if self.is_installed(server_id)? {
            return Err(Error::AlreadyInstalled(server_id.to_string()));
        }

        tracing::debug!(server_id, "provisioning MCP server");
        tokio::time::sleep(self.timing.install).await;

        let changed = {
            let conn = self.lock()?;
            conn.execute(
                r#"
                INSERT INTO servers (id, installed_at, running)
                VALUES (?1, ?2, 0)
                ON CONFLICT(id) DO NOTHING
                "#,
                params![server_id, Utc::now().to_rfc3339()],
            )?
        };

        if changed == 0 {
            return Err(Error::AlreadyInstalled(server_id.to_string()));
        }
        Ok(())
    }

    /// Start an installed server
    pub async fn start(&self, server_id: &str) -> Result<()> {
        match self.state_of(server_id)? {
            ServerState::Absent => return Err(Error::NotInstalled(server_id.to_string())),
            ServerState::Running => return Err(Error::AlreadyRunning(server_id.to_string())),
            ServerState::Installed => {}
        }

        tokio::time::sleep(self.timing.start).await;

        let changed = {
            let conn = self.lock()?;
            conn.execute(
                "UPDATE servers SET running = 1, started_at = ?2 WHERE id = ?1 AND running = 0",
                params![server_id, Utc::now().to_rfc3339()],
            )?
        };

        if changed == 0 {
            // Lost a race; report whatever state won
            return match self.state_of(server_id)? {
                ServerState::Absent => Err(Error::NotInstalled(server_id.to_string())),
                _ => Err(Error::AlreadyRunning(server_id.to_string())),
            };
        }
        Ok(())
    }

    /// Stop a running server
    pub async fn stop(&self, server_id: &str) -> Result<()> {
        if !self.is_running(server_id)? {
            return Err(Error::NotRunning(server_id.to_string()));
        }

        tokio::time::sleep(self.timing.stop).await;

        let changed = {
            let conn = self.lock()?;
            conn.execute(
                "UPDATE servers SET running = 0, started_at = NULL WHERE id = ?1 AND running = 1",
                params![server_id],
            )?
        };

        if changed == 0 {
            return Err(Error::NotRunning(server_id.to_string()));
        }
        Ok(())
    }

    /// Stop every running server at once, returning the ids that were stopped
    pub fn stop_all(&self) -> Result<Vec<String>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stopped: Vec<String> = {
            let mut stmt =
                tx.prepare("SELECT id FROM servers WHERE running = 1 ORDER BY installed_at, id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            ids
        };

        tx.execute(
            "UPDATE servers SET running = 0, started_at = NULL WHERE running = 1",
            [],
        )?;
        tx.commit()?;

        Ok(stopped)
    }

    /// Current installed and running sets
    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, running FROM servers ORDER BY installed_at, id")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut snapshot = RegistrySnapshot::default();
        for (id, running) in rows {
            if running {
                snapshot.running.push(id.clone());
            }
            snapshot.installed.push(id);
        }

        Ok(snapshot)
    }
}

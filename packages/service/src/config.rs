//! Runtime service configuration
//!
//! ServiceConfig is the single source of truth for what the running process
//! uses. It is read from the environment once at startup and never reloaded.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_PATH: &str = "./data/fragmentforge.db";
pub const DEFAULT_HTTP_PORT: u16 = 3100;

/// Runtime configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the embedded graph database directory
    /// (`FORGE_DATABASE_PATH`)
    pub database_path: PathBuf,

    /// Port the HTTP intake listens on (`FORGE_HTTP_PORT`)
    pub http_port: u16,
}

impl ServiceConfig {
    /// Read configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let database_path = env::var("FORGE_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));

        let http_port = env::var("FORGE_HTTP_PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);

        ServiceConfig {
            database_path,
            http_port,
        }
    }
}

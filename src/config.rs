use std::env;
use std::time::Duration;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const VENUES_PATH: &str = "venues.json";
const NARRATIVE_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// No URI means trips live in memory for the life of the process.
    pub mongo_uri: Option<String>,
    pub venues_path: String,
    pub narrative_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            mongo_uri: None,
            venues_path: VENUES_PATH.to_string(),
            narrative_timeout: Duration::from_secs(NARRATIVE_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            mongo_uri: env::var("MONGODB_URI")
                .ok()
                .filter(|uri| !uri.trim().is_empty()),
            venues_path: env::var("VENUES_PATH").unwrap_or(defaults.venues_path),
            narrative_timeout: env::var("NARRATIVE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.narrative_timeout),
        }
    }
}

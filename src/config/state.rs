// Application state module
// Everything a connection needs, built once at startup and shared read-only

use super::types::Config;
use crate::handler::Resolver;

/// Application state
pub struct AppState {
    pub config: Config,
    pub resolver: Resolver,
}

impl AppState {
    pub const fn new(config: Config, resolver: Resolver) -> Self {
        Self { config, resolver }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

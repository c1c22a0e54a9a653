//! Application state shared across connections

use std::sync::Arc;

use crate::config::Config;
use crate::game::Map;
use crate::lobby::GameService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub game: Arc<GameService>,
}

impl AppState {
    pub fn new(config: Config, map: Map) -> Self {
        let config = Arc::new(config);

        // One world for the lifetime of the server
        let game = Arc::new(GameService::new(map, config.max_players));

        Self { config, game }
    }
}

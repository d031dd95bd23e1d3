use std::sync::Arc;

use crate::{config::Config, services::tracker::SessionTracker};

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<SessionTracker>,
    pub config: Config,
}

impl AppState {
    pub fn new(tracker: Arc<SessionTracker>, config: Config) -> Self {
        Self { tracker, config }
    }
}

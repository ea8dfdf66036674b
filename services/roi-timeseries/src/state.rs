//! Application state for the ROI tool.

use std::sync::Arc;

use crate::platform::AnalysisPlatform;
use crate::roi::SessionStore;

/// Shared application state: the ROI sessions and the analysis platform.
pub struct AppState {
    pub sessions: SessionStore,
    pub platform: Arc<dyn AnalysisPlatform>,
}

impl AppState {
    pub fn new(platform: Arc<dyn AnalysisPlatform>) -> Self {
        Self {
            sessions: SessionStore::new(),
            platform,
        }
    }

    pub fn with_sessions(platform: Arc<dyn AnalysisPlatform>, sessions: SessionStore) -> Self {
        Self { sessions, platform }
    }
}

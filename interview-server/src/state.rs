use std::sync::Arc;

use crate::orchestrator::StageController;
use crate::session::SessionRegistry;

pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub controller: Arc<StageController>,
}

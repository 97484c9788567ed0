use std::sync::Arc;

use school_core::SchoolCore;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<SchoolCore>,
}

impl AppState {
    pub fn new(core: SchoolCore) -> Self {
        Self {
            core: Arc::new(core),
        }
    }
}

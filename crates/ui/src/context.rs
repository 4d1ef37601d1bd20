use std::sync::Arc;

use services::{ExportService, LessonService};

pub trait UiApp: Send + Sync {
    fn lesson(&self) -> Arc<LessonService>;
    fn exports(&self) -> Arc<ExportService>;
}

#[derive(Clone)]
pub struct AppContext {
    lesson: Arc<LessonService>,
    exports: Arc<ExportService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            lesson: app.lesson(),
            exports: app.exports(),
        }
    }

    #[must_use]
    pub fn lesson(&self) -> Arc<LessonService> {
        Arc::clone(&self.lesson)
    }

    #[must_use]
    pub fn exports(&self) -> Arc<ExportService> {
        Arc::clone(&self.exports)
    }
}

// Provided by the composition root in `crates/app`.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

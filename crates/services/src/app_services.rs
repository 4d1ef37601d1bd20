use std::sync::Arc;

use lesson_core::content;
use lesson_core::model::LessonScript;
use storage::repository::Storage;
use tokio::runtime::Handle;

use crate::Clock;
use crate::autosave::Autosave;
use crate::config::LessonConfig;
use crate::error::AppServicesError;
use crate::export_service::ExportService;
use crate::lesson_service::LessonService;
use crate::progress_store::ProgressStore;

/// Assembles app-facing services around the bundled lesson.
#[derive(Clone)]
pub struct AppServices {
    config: LessonConfig,
    lesson: Arc<LessonService>,
    exports: Arc<ExportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the bundled
    /// lesson does not validate.
    pub async fn new_sqlite(
        db_url: &str,
        config: LessonConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, config, clock).await
    }

    /// Build services over an existing storage, restoring any saved progress.
    ///
    /// Must run inside a tokio runtime; autosave tasks are spawned on it.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Script` if the bundled lesson does not validate.
    pub async fn from_storage(
        storage: Storage,
        config: LessonConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let script = Arc::new(content::eco_responders()?);
        Ok(Self::with_script(storage, script, config, clock).await)
    }

    pub async fn with_script(
        storage: Storage,
        script: Arc<LessonScript>,
        config: LessonConfig,
        clock: Clock,
    ) -> Self {
        let store = Arc::new(
            ProgressStore::load(
                Arc::clone(&storage.progress),
                config.state_slot(),
                script.entry_id().clone(),
                clock,
            )
            .await,
        );
        let autosave = Autosave::new(Arc::clone(&store), config.autosave_delay, Handle::current());
        let lesson = Arc::new(LessonService::new(
            script,
            store,
            autosave,
            config.share_base_url.clone(),
        ));
        let exports = Arc::new(ExportService::new(config.export_dir.clone()));

        Self {
            config,
            lesson,
            exports,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LessonConfig {
        &self.config
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

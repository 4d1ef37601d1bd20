use std::sync::Arc;

use lesson_core::codec;
use lesson_core::export::{self, JournalExport};
use lesson_core::model::{ChoiceKey, LessonScript, ProgressState, SaveKey, Section, SectionId};
use lesson_core::reveal::{RevealEngine, RevealOutcome};
use tokio::sync::watch;
use url::Url;

use crate::autosave::Autosave;
use crate::error::{LessonError, ResumeError, ShareError};
use crate::progress_store::{ProgressStore, SaveStatus};
use crate::share::{self, ShareArtifacts};

/// A learner action routed through [`LessonService::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonAction {
    /// A reveal button was pressed.
    Advance { target: SectionId },
    SelectChoice { key: ChoiceKey, label: String },
    /// "Continue" under a pending choice's feedback.
    ConfirmChoice { key: ChoiceKey },
    RecordJournal { key: SaveKey, text: String },
    /// "Start over".
    Reset,
}

/// Applies lesson actions to the store and decides how each one is persisted.
///
/// Reveal and choice actions are written immediately; journal typing goes through the
/// debounced [`Autosave`].
pub struct LessonService {
    script: Arc<LessonScript>,
    store: Arc<ProgressStore>,
    autosave: Autosave,
    share_base_url: String,
}

impl LessonService {
    #[must_use]
    pub fn new(
        script: Arc<LessonScript>,
        store: Arc<ProgressStore>,
        autosave: Autosave,
        share_base_url: impl Into<String>,
    ) -> Self {
        Self {
            script,
            store,
            autosave,
            share_base_url: share_base_url.into(),
        }
    }

    #[must_use]
    pub fn script(&self) -> Arc<LessonScript> {
        Arc::clone(&self.script)
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.store.snapshot()
    }

    #[must_use]
    pub fn visible_sections(&self) -> Vec<&Section> {
        RevealEngine::new(&self.script).visible_sections(&self.store.snapshot())
    }

    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.store.status()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.store.subscribe()
    }

    /// Applies `action` and persists the result.
    ///
    /// `Reset` reports the entry section as its scroll target.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` when a choice key or label is not in the script. The
    /// state is unchanged in that case.
    pub async fn dispatch(&self, action: LessonAction) -> Result<RevealOutcome, LessonError> {
        let engine = RevealEngine::new(&self.script);
        let outcome = match action {
            LessonAction::Advance { target } => {
                self.store.update(|state| engine.advance(state, &target))
            }
            LessonAction::SelectChoice { key, label } => self
                .store
                .update(|state| engine.select_choice(state, &key, &label))?,
            LessonAction::ConfirmChoice { key } => {
                self.store.update(|state| engine.confirm_choice(state, &key))
            }
            LessonAction::RecordJournal { key, text } => {
                let outcome = self
                    .store
                    .update(|state| engine.record_journal_text(state, &key, text));
                self.autosave.schedule();
                return Ok(outcome);
            }
            LessonAction::Reset => {
                self.autosave.cancel();
                self.store.reset().await;
                return Ok(RevealOutcome::Revealed {
                    section: self.script.entry_id().clone(),
                });
            }
        };

        if outcome.is_changed() {
            tracing::debug!(?outcome, "lesson state changed");
            self.autosave.flush().await;
        }
        Ok(outcome)
    }

    /// Replaces progress with the state carried by `raw`.
    ///
    /// Blank input is ignored and returns `Ok(false)`. A pending autosave is discarded
    /// before the decoded state replaces the current one.
    ///
    /// # Errors
    ///
    /// Returns `ResumeError::Unreadable` if the code does not decode; the current
    /// state is left untouched.
    pub async fn apply_resume_code(&self, raw: &str) -> Result<bool, ResumeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let state = codec::decode(trimmed, self.script.entry_id()).map_err(|err| {
            tracing::warn!(error = %err, "resume code rejected");
            ResumeError::Unreadable(err)
        })?;

        self.autosave.cancel();
        self.store.replace(state);
        self.store.persist().await;
        tracing::info!(
            revealed = self.store.snapshot().revealed().len(),
            "progress resumed from code"
        );
        Ok(true)
    }

    /// Applies a `resume` parameter found on `link`, if any, and returns the link with
    /// that parameter removed. A bad code is logged and otherwise ignored.
    pub async fn apply_resume_link(&self, link: &Url) -> Url {
        let (code, stripped) = codec::take_code_from_link(link);
        if let Some(code) = code {
            if let Err(err) = self.apply_resume_code(&code).await {
                tracing::warn!(error = %err, "ignoring resume link");
            }
        }
        stripped
    }

    /// Code, link and QR image for the current state.
    ///
    /// # Errors
    ///
    /// Returns `ShareError` if any of the three cannot be produced.
    pub fn share_artifacts(&self) -> Result<ShareArtifacts, ShareError> {
        share::share_artifacts(&self.store.snapshot(), &self.share_base_url)
    }

    #[must_use]
    pub fn journal_export(&self) -> JournalExport {
        export::collect(&self.script, &self.store.snapshot())
    }

    /// Writes any pending journal edit now.
    pub async fn flush(&self) {
        self.autosave.flush().await;
    }
}

//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::codec::CodecError;
use lesson_core::model::ScriptError;
use lesson_core::reveal::RevealError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `LessonService::dispatch`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonError {
    #[error(transparent)]
    Reveal(#[from] RevealError),
}

/// Errors emitted while applying a resume code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResumeError {
    #[error("That Resume Code could not be read. Please try again.")]
    Unreadable(#[source] CodecError),
}

/// Errors emitted while building the share code, link and QR image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShareError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("invalid share base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("could not build QR code: {0}")]
    Qr(qrcode::types::QrError),
}

/// Errors emitted by `ExportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("could not render the journal PDF: {0}")]
    Render(String),
    #[error("could not write {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

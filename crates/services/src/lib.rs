#![forbid(unsafe_code)]

pub mod app_services;
pub mod autosave;
pub mod config;
pub mod error;
pub mod export_service;
pub mod lesson_service;
pub mod progress_store;
pub mod share;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use autosave::Autosave;
pub use config::LessonConfig;
pub use error::{AppServicesError, ExportError, LessonError, ResumeError, ShareError};
pub use export_service::ExportService;
pub use lesson_service::{LessonAction, LessonService};
pub use progress_store::{ProgressStore, SaveStatus};
pub use share::ShareArtifacts;

//! Durable slots for learner progress.
//!
//! Repositories store opaque payloads; encoding and sanitizing progress is the
//! caller's job.

pub mod repository;
pub mod sqlite;

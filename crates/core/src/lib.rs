//! Pure lesson domain: the script model, learner progress, the reveal engine,
//! the resume-code codec and the journal export layout. No I/O lives here.

pub mod codec;
pub mod content;
pub mod error;
pub mod export;
pub mod model;
pub mod reveal;
pub mod time;

pub use error::Error;
pub use time::Clock;

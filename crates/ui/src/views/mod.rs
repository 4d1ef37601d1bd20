mod lesson;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use lesson::LessonView;
#[cfg(test)]
pub(crate) use lesson::LessonTestHandles;
pub use state::{ViewError, ViewState, view_state_from_resource};

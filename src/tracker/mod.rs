pub mod format;
pub mod report;
pub mod state;

pub use format::{duration_secs, format_duration, format_hhmmss};
pub use report::{Episode, SessionReport};
pub use state::{EmotionSession, EmotionTotals, SessionStatus, Transition};

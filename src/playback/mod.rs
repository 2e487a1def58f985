pub mod output;
pub mod scheduler;

pub use output::{AudioOutput, CpalOutput};
pub use scheduler::PlaybackScheduler;

pub mod commands;
pub mod operator;
pub mod progress;
pub mod ui;

pub use operator::InteractiveOperator;
pub use progress::{ConsoleRenderer, MessageLevel, ProgressEvent, ProgressState, ProgressTracker};

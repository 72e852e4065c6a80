pub mod orientation;
pub mod cursor;
pub mod record;
pub mod commands;
pub mod events;

pub use orientation::OrientationSample;
pub use cursor::{CursorPosition, Point};
pub use record::AcceptedSample;
pub use commands::SessionCommand;
pub use events::{PipelineEvent, SessionSnapshot, StatusLine, StatusTone};

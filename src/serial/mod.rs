pub mod decoder;
pub mod port;

pub use decoder::{decode_line, DecodeResult, SkipReason};
pub use port::{LineSource, SerialError, SerialLineSource};

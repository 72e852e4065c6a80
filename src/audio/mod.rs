pub mod player;

pub use player::{CueCommand, CuePlayer, ToneSpec};

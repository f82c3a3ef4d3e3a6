#![forbid(unsafe_code)]

//! Input: incremental decoding of the terminal byte stream into events.
//!
//! The grammar lives in [`decode`] and is pure; [`reader::EventReader`]
//! (Unix) adds the descriptor, the poll loop, and the notify/resize wake-up
//! paths around it.

pub mod buffer;
pub mod decode;
pub mod mouse;
pub mod paste;
#[cfg(unix)]
pub mod reader;

pub use buffer::InputBuffer;
pub use decode::{Step, decode};
pub use mouse::{MouseParse, parse_sgr_mouse};
pub use paste::PasteAccumulator;
#[cfg(unix)]
pub use reader::{DEFAULT_POLL_TIMEOUT, EventReader};

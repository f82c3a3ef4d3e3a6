#![forbid(unsafe_code)]

//! Core: the input event model shared by the byte-stream decoder and the
//! line editor, plus the logging facade.

pub mod event;
pub mod logging;

pub use event::{Event, Key, Modifiers, MouseEvent, MousePos};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

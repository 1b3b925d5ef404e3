// retune-core/src/lib.rs

//! The core logic for the retune tuner and keyboard.
//! This crate resolves detected frequencies into notes under a catalog of
//! just and equal-tempered tunings, and maps keyboard notes onto the same
//! catalog. It is completely headless: audio capture, pitch detection and
//! display are left to the caller.

pub mod error;
pub mod keyboard;
pub mod resolver;
pub mod session;
pub mod tuning;

pub use error::{Result, TunerError};
pub use keyboard::{frequency_for_note, Keyboard};
pub use resolver::{resolve, NoteSample, ResolvedNote, Resolver};
pub use session::{SessionEvent, SessionWorker, TunerDisplay, TunerSession, TunerSettings};
pub use tuning::{select_tuning, NameStyle, Tuning, TuningTable};

//! # Error Module
//!
//! Every failure the resolver, the tuning catalog and the keyboard mapper can
//! report. All of them are synchronous and detected locally.
//!
//! Sample-level errors (`InvalidSample`, and `InvalidTable` raised while
//! folding) are meant to be skipped by the caller, who keeps the last good
//! display. `UnknownTuning` and `NoteOutOfRange` point at a catalog mismatch
//! and should be surfaced as-is.

use thiserror::Error;

/// Result type for tuner operations.
pub type Result<T> = std::result::Result<T, TunerError>;

/// Errors that can occur while resolving notes or looking up tunings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TunerError {
    /// The sample is not a usable observation.
    #[error("invalid sample: frequency {frequency} Hz, amplitude {amplitude}")]
    InvalidSample {
        /// The offending frequency in Hz.
        frequency: f64,
        /// The offending amplitude.
        amplitude: f64,
    },

    /// The tuning table cannot be used for folding or matching.
    #[error("invalid tuning table '{name}': {reason}")]
    InvalidTable {
        /// Name of the table.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The name does not belong to the fixed catalog.
    #[error("unknown tuning: {0}")]
    UnknownTuning(String),

    /// The MIDI note has no entry in the tuning's keyboard table.
    #[error("MIDI note {note} is outside the {tuning} range {min}..={max}")]
    NoteOutOfRange {
        /// The requested MIDI note.
        note: u8,
        /// Key of the active tuning.
        tuning: String,
        /// Lowest playable note.
        min: u8,
        /// Highest playable note.
        max: u8,
    },
}

impl TunerError {
    /// True for errors a caller recovers from by dropping the current sample.
    pub fn is_sample_level(&self) -> bool {
        matches!(
            self,
            TunerError::InvalidSample { .. } | TunerError::InvalidTable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_level_classification() {
        let sample = TunerError::InvalidSample { frequency: -1.0, amplitude: 0.5 };
        let unknown = TunerError::UnknownTuning("Z".into());
        assert!(sample.is_sample_level());
        assert!(!unknown.is_sample_level());
    }

    #[test]
    fn out_of_range_message_names_the_span() {
        let err = TunerError::NoteOutOfRange {
            note: 30,
            tuning: "A".into(),
            min: 48,
            max: 72,
        };
        assert_eq!(err.to_string(), "MIDI note 30 is outside the A range 48..=72");
    }
}

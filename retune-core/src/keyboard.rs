//! # Keyboard Module
//!
//! Maps MIDI notes from the oscillator keyboard to frequencies under the
//! active tuning. Just tunings look the note up in their keyboard span, which
//! starts at C3 (MIDI 48); equal temperament is computed for the whole MIDI
//! range.

use crate::error::{Result, TunerError};
use crate::tuning::{self, Tuning};
use std::ops::RangeInclusive;

/// MIDI note of the first entry of every keyboard span.
pub const KEYBOARD_BASE_NOTE: u8 = 48;

/// Highest valid MIDI note.
pub const MAX_MIDI_NOTE: u8 = 127;

/// Notes that have a frequency under `tuning`.
pub fn playable_range(tuning: Tuning) -> RangeInclusive<u8> {
    match tuning.keyboard_table() {
        None => 0..=MAX_MIDI_NOTE,
        Some(table) => {
            let last = usize::from(KEYBOARD_BASE_NOTE) + table.len() - 1;
            KEYBOARD_BASE_NOTE..=last.min(usize::from(MAX_MIDI_NOTE)) as u8
        }
    }
}

/// Returns the frequency of a MIDI note under a tuning.
///
/// # Arguments
/// * `tuning` - The active keyboard tuning
/// * `note` - MIDI note number
///
/// # Returns
/// * `Ok(freq)` - Frequency in Hz
/// * `Err(TunerError::NoteOutOfRange)` - The note has no entry in the
///   tuning's keyboard span, or is not a MIDI note at all
pub fn frequency_for_note(tuning: Tuning, note: u8) -> Result<f64> {
    let range = playable_range(tuning);
    if !range.contains(&note) {
        return Err(TunerError::NoteOutOfRange {
            note,
            tuning: tuning.key().to_string(),
            min: *range.start(),
            max: *range.end(),
        });
    }

    match tuning.keyboard_table() {
        None => Ok(tuning::midi_to_frequency(note)),
        Some(table) => table
            .get(usize::from(note - KEYBOARD_BASE_NOTE))
            .ok_or_else(|| table.invalid("keyboard span shorter than its range")),
    }
}

/// Oscillator keyboard state: the active tuning and the sounding note.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyboard {
    tuning: Tuning,
    held: Option<u8>,
    frequency: f64,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            tuning: Tuning::Equal,
            held: None,
            frequency: 440.0,
        }
    }
}

impl Keyboard {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            ..Self::default()
        }
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    /// Switches tuning. Takes effect on the next `note_on`.
    pub fn set_tuning(&mut self, tuning: Tuning) {
        log::info!("keyboard tuning set to {}", tuning.long_name());
        self.tuning = tuning;
    }

    /// The note currently sounding, if any.
    pub fn held(&self) -> Option<u8> {
        self.held
    }

    pub fn is_playing(&self) -> bool {
        self.held.is_some()
    }

    /// Frequency of the last note played.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn playable_range(&self) -> RangeInclusive<u8> {
        playable_range(self.tuning)
    }

    /// Starts a note. On error nothing changes.
    pub fn note_on(&mut self, note: u8) -> Result<f64> {
        let frequency = frequency_for_note(self.tuning, note)?;
        self.held = Some(note);
        self.frequency = frequency;
        Ok(frequency)
    }

    /// Releases the keyboard. The last frequency is kept for display.
    pub fn note_off(&mut self, note: u8) {
        if self.held == Some(note) {
            self.held = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_temperament_covers_all_midi_notes() {
        assert_eq!(frequency_for_note(Tuning::Equal, 69).unwrap(), 440.0);
        assert!((frequency_for_note(Tuning::Equal, 0).unwrap() - 8.1758).abs() < 1e-3);
        assert!(frequency_for_note(Tuning::Equal, 127).is_ok());
        assert!(matches!(
            frequency_for_note(Tuning::Equal, 128),
            Err(TunerError::NoteOutOfRange { note: 128, .. })
        ));
    }

    #[test]
    fn just_tunings_index_from_c3() {
        assert_eq!(frequency_for_note(Tuning::A, 48).unwrap(), 132.0);
        assert_eq!(frequency_for_note(Tuning::A, 69).unwrap(), 440.0);
        assert_eq!(frequency_for_note(Tuning::A, 72).unwrap(), 528.0);
        assert_eq!(frequency_for_note(Tuning::C, 60).unwrap(), 261.6);
    }

    #[test]
    fn notes_outside_the_span_are_rejected() {
        for tuning in Tuning::ALL.into_iter().filter(|t| !t.is_equal_temperament()) {
            let range = playable_range(tuning);
            let len = tuning.keyboard_table().unwrap().len();
            assert_eq!(usize::from(*range.end() - *range.start()) + 1, len);
            assert!(frequency_for_note(tuning, *range.start() - 1).is_err());
            assert!(frequency_for_note(tuning, *range.end() + 1).is_err());
            assert!(frequency_for_note(tuning, *range.end()).is_ok());
        }
        assert_eq!(
            frequency_for_note(Tuning::D, 72),
            Err(TunerError::NoteOutOfRange {
                note: 72,
                tuning: "D".into(),
                min: 48,
                max: 71,
            })
        );
    }

    #[test]
    fn failed_note_on_keeps_state() {
        let mut keys = Keyboard::new(Tuning::BFlat);
        assert_eq!(keys.note_on(57).unwrap(), 219.1);
        assert!(keys.note_on(20).is_err());
        assert_eq!(keys.held(), Some(57));
        assert_eq!(keys.frequency(), 219.1);
    }

    #[test]
    fn note_off_releases_only_the_held_note() {
        let mut keys = Keyboard::default();
        keys.note_on(60).unwrap();
        keys.note_off(61);
        assert!(keys.is_playing());
        keys.note_off(60);
        assert!(!keys.is_playing());
    }

    #[test]
    fn tuning_change_applies_to_next_note() {
        let mut keys = Keyboard::default();
        keys.note_on(69).unwrap();
        keys.set_tuning(Tuning::E);
        assert_eq!(keys.frequency(), 440.0);
        assert_eq!(keys.note_on(69).unwrap(), 440.04);
        assert_eq!(keys.playable_range(), 48..=72);
    }
}

//! # Musical Tuning Module
//!
//! This module holds the fixed catalog of tuning tables shared by the tuner
//! and the oscillator keyboard, along with the note-name tables and the small
//! pitch helpers built on equal temperament.
//!
//! ## Features
//! - 13 named tunings: equal temperament plus 12 just tunings keyed by root
//! - One reference octave per tuning for note resolution
//! - A two-octave keyboard span per just tuning (MIDI 48 upwards)
//! - Sharp and flat note spellings
//! - Cent deviation and MIDI-to-frequency helpers
//!
//! Table contents are build-time constants and are never mutated. Two tables
//! are irregular and kept verbatim: the D tuning omits C♯, and the Gb tuning
//! repeats its F♯ entry.

use crate::error::{Result, TunerError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Frequency of C0 in equal temperament with A4 = 440 Hz.
pub const C0_HZ: f64 = 16.351_597_831_287_414;

/// Note names spelled with sharps, indexed by pitch class (C = 0).
pub const SHARP_NAMES: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];

/// Note names spelled with flats, indexed by pitch class (C = 0).
pub const FLAT_NAMES: [&str; 12] = [
    "C", "D♭", "D", "E♭", "E", "F", "G♭", "G", "A♭", "A", "B♭", "B",
];

/// Which spelling to use when displaying a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    #[default]
    Sharp,
    Flat,
}

impl NameStyle {
    /// Returns the name of a pitch class in this spelling.
    pub fn name(self, pitch_class: usize) -> &'static str {
        let names = match self {
            NameStyle::Sharp => &SHARP_NAMES,
            NameStyle::Flat => &FLAT_NAMES,
        };
        names[pitch_class % 12]
    }
}

/// An ordered set of reference frequencies under one tuning system.
///
/// A usable table has at least two entries, all positive and finite, in
/// non-decreasing order with a lowest entry strictly below the highest.
/// Repeated entries are tolerated; the nearest-match scan never selects the
/// second copy.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningTable {
    name: Cow<'static, str>,
    frequencies: Cow<'static, [f64]>,
}

impl TuningTable {
    /// Wraps constant catalog data without validation.
    pub const fn from_static(name: &'static str, frequencies: &'static [f64]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            frequencies: Cow::Borrowed(frequencies),
        }
    }

    /// Builds a custom table, rejecting anything [`TuningTable::validate`] would.
    pub fn new(name: impl Into<String>, frequencies: Vec<f64>) -> Result<Self> {
        let table = Self {
            name: Cow::Owned(name.into()),
            frequencies: Cow::Owned(frequencies),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.frequencies.get(index).copied()
    }

    /// Lowest entry of the table.
    pub fn min(&self) -> Option<f64> {
        self.frequencies.first().copied()
    }

    /// Highest entry of the table.
    pub fn max(&self) -> Option<f64> {
        self.frequencies.last().copied()
    }

    /// Checks that the table can be folded into and searched.
    ///
    /// # Returns
    /// * `Ok(())` - The table is usable
    /// * `Err(TunerError::InvalidTable)` - Fewer than two entries, a
    ///   non-positive or non-finite entry, a decreasing step, or no spread
    pub fn validate(&self) -> Result<()> {
        if self.frequencies.len() < 2 {
            return Err(self.invalid("needs at least two entries"));
        }
        if let Some(bad) = self
            .frequencies
            .iter()
            .find(|f| !f.is_finite() || **f <= 0.0)
        {
            return Err(self.invalid(&format!("entry {bad} is not a positive frequency")));
        }
        if let Some(step) = self.frequencies.windows(2).position(|w| w[1] < w[0]) {
            return Err(self.invalid(&format!("entries decrease at index {}", step + 1)));
        }
        // Non-decreasing with at least two entries, so first/last exist.
        let (lo, hi) = (self.frequencies[0], self.frequencies[self.frequencies.len() - 1]);
        if lo >= hi {
            return Err(self.invalid("entries do not span any interval"));
        }
        Ok(())
    }

    pub(crate) fn invalid(&self, reason: &str) -> TunerError {
        TunerError::InvalidTable {
            name: self.name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// The 13 tunings of the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tuning {
    #[default]
    #[serde(rename = "EQ")]
    Equal,
    A,
    #[serde(rename = "Bb")]
    BFlat,
    B,
    C,
    #[serde(rename = "Db")]
    DFlat,
    D,
    #[serde(rename = "Eb")]
    EFlat,
    E,
    F,
    #[serde(rename = "Gb")]
    GFlat,
    G,
    #[serde(rename = "Ab")]
    AFlat,
}

impl Tuning {
    /// All tunings in menu order.
    pub const ALL: [Tuning; 13] = [
        Tuning::Equal,
        Tuning::A,
        Tuning::BFlat,
        Tuning::B,
        Tuning::C,
        Tuning::DFlat,
        Tuning::D,
        Tuning::EFlat,
        Tuning::E,
        Tuning::F,
        Tuning::GFlat,
        Tuning::G,
        Tuning::AFlat,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Short catalog key, e.g. `"EQ"` or `"Bb"`.
    pub fn key(self) -> &'static str {
        TUNER_TABLES[self.index()].name()
    }

    /// Descriptive name, e.g. `"EqualTemperament"` or `"JustBb"`.
    pub fn long_name(self) -> &'static str {
        LONG_NAMES[self.index()]
    }

    /// Menu label, e.g. `"Bb-Tuning"`.
    pub fn menu_label(self) -> String {
        format!("{}-Tuning", self.key())
    }

    pub fn is_equal_temperament(self) -> bool {
        self == Tuning::Equal
    }

    /// The single reference octave used by the tuner.
    pub fn tuner_table(self) -> &'static TuningTable {
        &TUNER_TABLES[self.index()]
    }

    /// The keyboard span starting at MIDI note 48, or `None` for equal
    /// temperament, which is computed instead of looked up.
    pub fn keyboard_table(self) -> Option<&'static TuningTable> {
        self.index()
            .checked_sub(1)
            .map(|i| &KEYBOARD_TABLES[i])
    }
}

impl fmt::Display for Tuning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Tuning {
    type Err = TunerError;

    /// Accepts the key, long name or menu label, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        TUNING_MAP
            .get(&s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| TunerError::UnknownTuning(s.to_string()))
    }
}

/// Looks up a tuner table by name.
///
/// # Arguments
/// * `name` - Catalog key (`"EQ"`, `"Bb"`), long name (`"JustBb"`) or menu
///   label (`"Bb-Tuning"`), case-insensitive
///
/// # Returns
/// * `Ok(table)` - The reference octave for that tuning
/// * `Err(TunerError::UnknownTuning)` - The name is not in the catalog
pub fn select_tuning(name: &str) -> Result<&'static TuningTable> {
    name.parse::<Tuning>().map(Tuning::tuner_table)
}

/// Static map for name to tuning lookups.
///
/// Every tuning is reachable by its key, long name and menu label, all
/// stored lowercase.
static TUNING_MAP: Lazy<BTreeMap<String, Tuning>> = Lazy::new(|| {
    Tuning::ALL
        .iter()
        .flat_map(|&t| {
            [t.key().to_string(), t.long_name().to_string(), t.menu_label()]
                .into_iter()
                .map(move |name| (name.to_lowercase(), t))
        })
        .collect()
});

const LONG_NAMES: [&str; 13] = [
    "EqualTemperament",
    "JustA",
    "JustBb",
    "JustB",
    "JustC",
    "JustDb",
    "JustD",
    "JustEb",
    "JustE",
    "JustF",
    "JustGb",
    "JustG",
    "JustAb",
];

/// Reference octaves (octave 0), in `Tuning` order.
static TUNER_TABLES: [TuningTable; 13] = [
    TuningTable::from_static("EQ", &[16.35, 17.32, 18.35, 19.45, 20.6, 21.83, 23.12, 24.5, 25.96, 27.5, 29.14, 30.87]),
    TuningTable::from_static("A", &[16.5, 17.19, 18.29, 19.25, 20.62, 22.0, 22.96, 24.75, 25.85, 27.5, 29.29, 30.94]),
    TuningTable::from_static("Bb", &[16.32, 17.48, 18.21, 19.38, 20.39, 21.85, 23.31, 24.33, 26.22, 27.39, 29.14, 31.03]),
    TuningTable::from_static("B", &[16.51, 17.29, 18.52, 19.29, 20.53, 21.61, 23.15, 24.69, 25.77, 27.78, 29.02, 30.87]),
    TuningTable::from_static("C", &[16.35, 17.5, 18.31, 19.62, 20.44, 21.75, 22.89, 24.52, 26.16, 27.3, 29.43, 30.74]),
    TuningTable::from_static("Db", &[16.24, 17.32, 18.54, 19.4, 20.79, 21.66, 23.04, 24.25, 25.98, 27.72, 28.93, 31.18]),
    TuningTable::from_static("D", &[16.52, 18.35, 19.64, 20.56, 22.02, 22.94, 24.41, 25.7, 27.53, 29.37, 30.65]),
    TuningTable::from_static("Eb", &[16.19, 17.5, 18.23, 19.45, 20.81, 21.78, 23.33, 24.31, 25.86, 27.22, 29.17, 31.11]),
    TuningTable::from_static("E", &[16.48, 17.15, 18.54, 19.31, 20.6, 22.04, 23.07, 24.72, 25.75, 27.4, 28.84, 30.9]),
    TuningTable::from_static("F", &[16.37, 17.46, 18.17, 19.64, 20.46, 21.83, 23.35, 24.45, 26.19, 27.28, 29.03, 30.56]),
    TuningTable::from_static("Gb", &[16.19, 17.34, 18.5, 19.25, 20.81, 21.68, 23.12, 23.12, 24.74, 25.9, 27.75, 28.91, 30.76]),
    TuningTable::from_static("G", &[16.29, 17.15, 18.38, 19.6, 20.46, 22.05, 23.03, 24.5, 26.09, 27.56, 29.4, 30.62]),
    TuningTable::from_static("Ab", &[16.22, 17.26, 18.17, 19.47, 20.77, 21.68, 23.36, 24.4, 25.96, 27.64, 29.2, 31.15]),
];

/// Keyboard spans from MIDI 48 (C3), in `Tuning` order minus equal temperament.
static KEYBOARD_TABLES: [TuningTable; 12] = [
    TuningTable::from_static("A", &[
        132.0, 137.5, 146.3, 154.0, 165.0, 176.0, 183.7, 198.0, 206.8, 220.0, 234.3, 247.5,
        264.0, 275.0, 293.7, 308.0, 330.0, 352.0, 366.3, 396.0, 412.5, 440.0, 470.8, 492.8,
        528.0,
    ]),
    TuningTable::from_static("Bb", &[
        130.52, 139.85, 145.68, 155.0, 163.16, 174.81, 186.46, 194.62, 209.77, 219.1, 233.08, 248.23,
        262.22, 279.7, 291.35, 311.16, 326.31, 349.62, 372.93, 388.08, 419.54, 437.03, 466.16, 498.8,
        522.08,
    ]),
    TuningTable::from_static("B", &[
        132.11, 138.29, 148.16, 154.34, 164.22, 172.86, 185.2, 197.55, 206.19, 222.25, 232.12, 246.94,
        262.99, 277.81, 296.33, 308.68, 329.66, 345.72, 370.41, 395.1, 411.16, 444.49, 463.01, 493.88,
        528.44,
    ]),
    TuningTable::from_static("C", &[
        130.8, 139.96, 146.5, 156.96, 163.5, 173.96, 183.12, 196.2, 209.28, 218.44, 235.44, 245.9,
        261.6, 278.6, 294.3, 313.92, 327.0, 349.24, 366.24, 392.4, 418.56, 435.56, 470.88, 490.5,
        523.25,
    ]),
    TuningTable::from_static("Db", &[
        129.93, 138.59, 148.29, 155.22, 166.31, 173.24, 184.32, 194.03, 207.88, 221.74, 231.45, 249.46,
        260.55, 277.18, 295.2, 311.83, 332.62, 346.48, 370.04, 388.05, 415.77, 443.49, 461.5, 498.92,
        519.71,
    ]),
    TuningTable::from_static("D", &[
        132.15, 146.83, 157.11, 164.45, 176.2, 183.54, 195.28, 205.56, 220.25, 234.93, 245.21,
        264.29, 276.04, 293.66, 312.75, 330.37, 352.39, 367.08, 392.04, 411.12, 440.49, 469.86, 488.94,
        528.59,
    ]),
    TuningTable::from_static("Eb", &[
        129.5, 140.0, 145.84, 155.56, 166.45, 174.23, 186.67, 194.45, 206.89, 217.78, 233.34, 248.9,
        259.79, 280.01, 292.45, 311.12, 331.34, 350.01, 373.34, 388.9, 415.35, 435.57, 466.68, 497.79,
        518.01,
    ]),
    TuningTable::from_static("E", &[
        131.85, 137.21, 148.33, 154.51, 164.81, 176.35, 184.59, 197.77, 206.01, 219.2, 230.73, 247.22,
        263.7, 275.23, 296.66, 309.84, 329.62, 351.05, 370.82, 395.54, 412.02, 440.04, 461.47, 494.43,
        527.39,
    ]),
    TuningTable::from_static("F", &[
        130.96, 139.69, 145.36, 157.15, 163.7, 174.61, 186.83, 195.56, 209.53, 218.26, 232.23, 244.45,
        261.92, 279.38, 291.6, 314.3, 328.27, 349.22, 371.92, 392.87, 419.06, 436.53, 466.21, 488.91,
        523.83,
    ]),
    TuningTable::from_static("Gb", &[
        129.5, 138.75, 148.0, 154.01, 166.5, 173.44, 185.0, 185.0, 197.95, 207.2, 222.0, 231.25,
        246.05, 259.0, 277.5, 296.0, 308.95, 333.0, 347.8, 370.0, 394.05, 416.25, 444.0, 462.5,
        493.95, 518.0,
    ]),
    TuningTable::from_static("G", &[
        130.34, 137.2, 147.0, 156.8, 163.66, 176.4, 184.24, 196.0, 208.74, 220.5, 235.2, 245.0,
        261.66, 274.4, 294.0, 313.6, 326.34, 352.8, 367.5, 392.0, 419.44, 439.04, 470.4, 490.0,
        521.36,
    ]),
    TuningTable::from_static("Ab", &[
        129.79, 138.09, 145.36, 155.75, 166.13, 173.4, 186.89, 195.2, 207.66, 221.16, 233.62, 249.19,
        259.57, 277.23, 290.72, 311.49, 332.26, 345.75, 373.79, 389.36, 415.32, 444.4, 465.16, 498.4,
        519.16,
    ]),
];

/// Returns the equal-tempered pitch class (C = 0) nearest to a frequency.
///
/// Used to name table entries, which need not line up one-to-one with the
/// twelve note names.
pub fn pitch_class_of(freq: f64) -> usize {
    let semitones = (12.0 * (freq / C0_HZ).log2()).round() as i64;
    semitones.rem_euclid(12) as usize
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `target_freq` - Target frequency in Hz
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat)
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// Equal-temperament frequency of a MIDI note with A4 (69) = 440 Hz.
pub fn midi_to_frequency(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((f64::from(note) - 69.0) / 12.0)
}

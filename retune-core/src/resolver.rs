//! # Note Resolver Module
//!
//! Turns a detected frequency into a note under a tuning table: the table
//! entry it is nearest to, the octave it sits in, and how far off it is in
//! cents.
//!
//! The frequency is first folded into the table's reference octave by
//! repeated halving and doubling, counting the net octave shift as it goes.
//! The folded value is then matched against the table entries and compared
//! to the winner in cents.

use crate::error::{Result, TunerError};
use crate::tuning::{self, NameStyle, TuningTable};
use serde::Serialize;

/// Samples at or below this amplitude are ignored.
pub const AMPLITUDE_GATE: f64 = 0.05;

/// Upper bound on halvings (and separately doublings) while folding.
pub const MAX_FOLD_STEPS: u32 = 32;

/// One observation from the pitch tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSample {
    /// Detected frequency in Hz.
    pub frequency: f64,
    /// Signal amplitude (0.0 to 1.0).
    pub amplitude: f64,
}

impl NoteSample {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self { frequency, amplitude }
    }

    /// Rejects non-positive or non-finite frequencies and amplitudes outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let frequency_ok = self.frequency.is_finite() && self.frequency > 0.0;
        let amplitude_ok = (0.0..=1.0).contains(&self.amplitude);
        if frequency_ok && amplitude_ok {
            Ok(())
        } else {
            Err(TunerError::InvalidSample {
                frequency: self.frequency,
                amplitude: self.amplitude,
            })
        }
    }
}

/// The note a sample resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedNote {
    /// The unfolded input frequency in Hz.
    pub pitch_hz: f64,
    /// The input folded into the table's reference octave.
    pub folded_hz: f64,
    /// Index of the matched entry in the table.
    pub note_index: usize,
    /// The matched table entry in Hz.
    pub reference_hz: f64,
    /// Pitch class of the matched entry (C = 0).
    pub pitch_class: usize,
    /// Octave number; A 440 Hz is octave 4 under equal temperament.
    pub octave: i32,
    /// Deviation from the matched entry in cents, rounded.
    pub cents_deviation: f64,
    pub name_sharp: &'static str,
    pub name_flat: &'static str,
}

impl ResolvedNote {
    /// Note name in the requested spelling, without octave.
    pub fn name(&self, style: NameStyle) -> &'static str {
        match style {
            NameStyle::Sharp => self.name_sharp,
            NameStyle::Flat => self.name_flat,
        }
    }

    /// Note name with octave number, e.g. `"A4"` or `"B♭3"`.
    pub fn display_name(&self, style: NameStyle) -> String {
        format!("{}{}", self.name(style), self.octave)
    }
}

/// A frequency folded into a table's reference octave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Folded {
    pub frequency: f64,
    /// Net octave shift: halvings minus doublings.
    pub octaves: i32,
}

/// Folds a frequency into the octave spanned by `table`.
///
/// Halves while above the highest entry, then doubles while below the
/// lowest. A table spanning less than an octave leaves frequencies between
/// its top entry and twice its bottom entry above the top; those are
/// matched against the top entry as they are.
///
/// # Returns
/// * `Ok(folded)` - Folded frequency and the octave shift applied
/// * `Err(TunerError::InvalidTable)` - The table is unusable, or folding took
///   more than [`MAX_FOLD_STEPS`] steps in either direction
pub fn fold_into_octave(frequency: f64, table: &TuningTable) -> Result<Folded> {
    table.validate()?;
    let (lo, hi) = match (table.min(), table.max()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Err(table.invalid("table is empty")),
    };

    let mut folded = frequency;
    let mut octaves = 0;

    let mut steps = 0;
    while folded > hi {
        if steps == MAX_FOLD_STEPS {
            return Err(table.invalid("octave folding did not converge"));
        }
        folded /= 2.0;
        octaves += 1;
        steps += 1;
    }

    steps = 0;
    while folded < lo {
        if steps == MAX_FOLD_STEPS {
            return Err(table.invalid("octave folding did not converge"));
        }
        folded *= 2.0;
        octaves -= 1;
        steps += 1;
    }

    Ok(Folded { frequency: folded, octaves })
}

/// Finds the table entry nearest to `frequency`.
///
/// Ties go to the lowest index.
pub fn nearest_index(frequency: f64, table: &TuningTable) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &reference) in table.frequencies().iter().enumerate() {
        let distance = (reference - frequency).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Resolves a sample against a tuning table.
///
/// The amplitude gate is not applied here; see [`Resolver`].
///
/// # Arguments
/// * `sample` - Frequency and amplitude from the pitch tracker
/// * `table` - The active tuning table
///
/// # Returns
/// * `Ok(note)` - The resolved note
/// * `Err(TunerError::InvalidSample)` - The sample is out of domain
/// * `Err(TunerError::InvalidTable)` - The table is degenerate or folding failed
pub fn resolve(sample: NoteSample, table: &TuningTable) -> Result<ResolvedNote> {
    sample.validate()?;
    let folded = fold_into_octave(sample.frequency, table)?;

    let note_index = nearest_index(folded.frequency, table)
        .ok_or_else(|| table.invalid("table is empty"))?;
    let reference_hz = table.frequencies()[note_index];

    let cents = tuning::calculate_cents_deviation(folded.frequency, reference_hz).round();
    let pitch_class = tuning::pitch_class_of(reference_hz);

    Ok(ResolvedNote {
        pitch_hz: sample.frequency,
        folded_hz: folded.frequency,
        note_index,
        reference_hz,
        pitch_class,
        octave: folded.octaves,
        cents_deviation: cents,
        name_sharp: NameStyle::Sharp.name(pitch_class),
        name_flat: NameStyle::Flat.name(pitch_class),
    })
}

/// Applies the amplitude gate in front of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolver {
    gate: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self { gate: AMPLITUDE_GATE }
    }
}

impl Resolver {
    pub fn with_gate(gate: f64) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> f64 {
        self.gate
    }

    /// Resolves the sample if it is loud enough.
    ///
    /// # Returns
    /// * `Ok(Some(note))` - The sample passed the gate and resolved
    /// * `Ok(None)` - The sample was gated; keep the previous display
    /// * `Err(e)` - The sample passed the gate but could not be resolved
    pub fn process(&self, sample: NoteSample, table: &TuningTable) -> Result<Option<ResolvedNote>> {
        if sample.amplitude <= self.gate {
            return Ok(None);
        }
        resolve(sample, table).map(Some)
    }
}

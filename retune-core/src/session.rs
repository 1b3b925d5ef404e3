//! # Tuner Session Module
//!
//! The serialized context that owns the tuner's mutable state: the selected
//! tuning, the note-name spelling and the note currently on display. Samples
//! and menu actions are applied strictly in arrival order, so a tuning
//! change never races an in-flight resolution.
//!
//! ## Architecture
//! - **Caller thread**: pushes `SessionEvent`s into a crossbeam channel
//! - **Session thread**: applies events in order and publishes each new
//!   `ResolvedNote`
//! - **Shutdown**: a separate channel stops the loop

use crate::error::Result;
use crate::resolver::{NoteSample, ResolvedNote, Resolver, AMPLITUDE_GATE};
use crate::tuning::{NameStyle, Tuning};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};

/// User-facing tuner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerSettings {
    pub tuning: Tuning,
    pub name_style: NameStyle,
    /// Samples at or below this amplitude are ignored.
    pub amplitude_gate: f64,
}

impl Default for TunerSettings {
    fn default() -> Self {
        Self {
            tuning: Tuning::Equal,
            name_style: NameStyle::Sharp,
            amplitude_gate: AMPLITUDE_GATE,
        }
    }
}

/// Something that happened to the tuner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// A new observation from the pitch tracker.
    Sample(NoteSample),
    /// The user picked a tuning from the menu.
    SelectTuning(Tuning),
    /// The user switched between sharp and flat names.
    SetNameStyle(NameStyle),
}

/// Tuner state plus the last note shown.
#[derive(Debug, Clone, Default)]
pub struct TunerSession {
    settings: TunerSettings,
    display: Option<ResolvedNote>,
}

impl TunerSession {
    pub fn new(settings: TunerSettings) -> Self {
        Self {
            settings,
            display: None,
        }
    }

    pub fn settings(&self) -> &TunerSettings {
        &self.settings
    }

    /// The note on display, if any sample has resolved yet.
    pub fn display(&self) -> Option<&ResolvedNote> {
        self.display.as_ref()
    }

    /// The displayed note's name in the current spelling, or `"-"`.
    pub fn display_name(&self) -> String {
        self.display
            .as_ref()
            .map(|note| note.display_name(self.settings.name_style))
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn select_tuning(&mut self, tuning: Tuning) {
        log::info!("tuner tuning set to {}", tuning.long_name());
        self.settings.tuning = tuning;
    }

    pub fn set_name_style(&mut self, style: NameStyle) {
        log::info!("note names set to {style:?}");
        self.settings.name_style = style;
    }

    /// Resolves a sample against the current tuning.
    ///
    /// # Returns
    /// * `Ok(Some(note))` - The display was updated
    /// * `Ok(None)` - The sample was below the gate; display unchanged
    /// * `Err(e)` - The sample could not be resolved; display unchanged
    pub fn push_sample(&mut self, sample: NoteSample) -> Result<Option<&ResolvedNote>> {
        let resolver = Resolver::with_gate(self.settings.amplitude_gate);
        match resolver.process(sample, self.settings.tuning.tuner_table())? {
            Some(note) => {
                self.display = Some(note);
                Ok(self.display.as_ref())
            }
            None => Ok(None),
        }
    }

    /// Applies one event and returns the new display if it changed.
    ///
    /// Unresolvable samples are logged and dropped.
    pub fn handle(&mut self, event: SessionEvent) -> Option<&ResolvedNote> {
        match event {
            SessionEvent::Sample(sample) => match self.push_sample(sample) {
                Ok(updated) => updated,
                Err(e) => {
                    log::debug!("dropping sample {sample:?}: {e}");
                    None
                }
            },
            SessionEvent::SelectTuning(tuning) => {
                self.select_tuning(tuning);
                None
            }
            SessionEvent::SetNameStyle(style) => {
                self.set_name_style(style);
                None
            }
        }
    }
}

/// What the session thread publishes after each resolved sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunerDisplay {
    pub note: ResolvedNote,
    /// Note name with octave in the spelling active at the time.
    pub name: String,
}

/// A `TunerSession` running on its own thread.
#[derive(Debug)]
pub struct SessionWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<TunerSession>>,
}

impl SessionWorker {
    /// Starts a session thread.
    ///
    /// # Arguments
    /// * `settings` - Initial tuner settings
    /// * `events` - Incoming samples and menu actions
    /// * `updates` - Receives every newly resolved note with its display name
    ///
    /// The loop ends when `shutdown` is called, when `events` disconnects,
    /// or when nobody listens on `updates` any more.
    pub fn spawn(
        settings: TunerSettings,
        events: Receiver<SessionEvent>,
        updates: Sender<TunerDisplay>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_handle = thread::spawn(move || {
            log::info!("tuner session started");
            let mut session = TunerSession::new(settings);
            loop {
                crossbeam_channel::select! {
                    recv(shutdown_rx) -> _ => break,
                    recv(events) -> event => {
                        let Ok(event) = event else { break };
                        let Some(note) = session.handle(event).cloned() else { continue };
                        let name = note.display_name(session.settings().name_style);
                        if updates.send(TunerDisplay { note, name }).is_err() {
                            break;
                        }
                    }
                }
            }
            log::info!("tuner session stopped");
            session
        });

        Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        }
    }

    /// Stops the loop and returns the final session state.
    pub fn shutdown(self) -> Option<TunerSession> {
        let _ = self.shutdown_tx.try_send(());
        self.join()
    }

    /// Waits for the loop to end on its own and returns the final state.
    pub fn join(mut self) -> Option<TunerSession> {
        self.thread_handle.take().and_then(|handle| handle.join().ok())
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.shutdown_tx.try_send(());
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_and_invalid_samples_keep_display() {
        let mut session = TunerSession::default();
        let shown = session.handle(SessionEvent::Sample(NoteSample::new(440.0, 0.5)));
        assert!(shown.is_some());

        assert!(session.handle(SessionEvent::Sample(NoteSample::new(220.0, 0.01))).is_none());
        assert!(session.handle(SessionEvent::Sample(NoteSample::new(-5.0, 0.5))).is_none());
        assert_eq!(session.display_name(), "A4");
    }

    #[test]
    fn name_style_changes_display_without_resolving() {
        let mut session = TunerSession::default();
        assert_eq!(session.display_name(), "-");
        session.handle(SessionEvent::Sample(NoteSample::new(233.08, 0.5)));
        assert_eq!(session.display_name(), "A♯3");
        session.handle(SessionEvent::SetNameStyle(NameStyle::Flat));
        assert_eq!(session.display_name(), "B♭3");
    }

    #[test]
    fn tuning_change_applies_to_later_samples() {
        let mut session = TunerSession::default();
        let before = session
            .handle(SessionEvent::Sample(NoteSample::new(352.0, 0.5)))
            .cloned()
            .unwrap();
        session.handle(SessionEvent::SelectTuning(Tuning::A));
        assert_eq!(session.display(), Some(&before));

        let after = session
            .handle(SessionEvent::Sample(NoteSample::new(352.0, 0.5)))
            .cloned()
            .unwrap();
        assert_eq!(before.cents_deviation, 13.0);
        assert_eq!(after.cents_deviation, 0.0);
    }

    #[test]
    fn push_sample_reports_errors() {
        let mut session = TunerSession::default();
        assert!(session.push_sample(NoteSample::new(440.0, 2.0)).is_err());
        assert!(session.display().is_none());
    }

    #[test]
    fn worker_applies_events_in_order() {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (update_tx, update_rx) = crossbeam_channel::unbounded();
        let worker = SessionWorker::spawn(TunerSettings::default(), event_rx, update_tx);

        event_tx.send(SessionEvent::Sample(NoteSample::new(440.0, 0.5))).unwrap();
        event_tx.send(SessionEvent::SelectTuning(Tuning::GFlat)).unwrap();
        event_tx.send(SessionEvent::Sample(NoteSample::new(0.0, 0.5))).unwrap();
        event_tx.send(SessionEvent::Sample(NoteSample::new(444.0, 0.5))).unwrap();
        drop(event_tx);

        let session = worker.join().unwrap();
        let updates: Vec<TunerDisplay> = update_rx.try_iter().collect();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].name, "A4");
        assert_eq!(updates[0].note.cents_deviation, 0.0);
        assert_eq!(updates[1].note.reference_hz, 27.75);
        assert_eq!(session.settings().tuning, Tuning::GFlat);
        assert_eq!(session.display(), updates.last().map(|u| &u.note));
    }

    #[test]
    fn worker_stops_on_shutdown() {
        let (_event_tx, event_rx) = crossbeam_channel::unbounded::<SessionEvent>();
        let (update_tx, _update_rx) = crossbeam_channel::unbounded();
        let worker = SessionWorker::spawn(TunerSettings::default(), event_rx, update_tx);
        let session = worker.shutdown().unwrap();
        assert!(session.display().is_none());
    }
}

//! # retune - command-line tuner
//!
//! Drives `retune-core` from the terminal: resolve single frequencies,
//! stream pitch-tracker samples through a tuner session, look up keyboard
//! frequencies and list the tuning catalog.
//!
//! Logging goes to stderr through `env_logger`; set `RUST_LOG=info` to see
//! session activity.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use retune_core::{
    NameStyle, NoteSample, ResolvedNote, Resolver, SessionEvent, SessionWorker, TunerDisplay,
    TunerSettings, Tuning, keyboard,
};
use std::io::{self, BufRead};
use std::thread;

/// Note resolver and keyboard mapper for just and equal-tempered tunings
#[derive(Parser)]
#[command(name = "retune")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single frequency to a note
    Resolve {
        /// Frequency in Hz
        frequency: f64,

        /// Sample amplitude (0.0 to 1.0)
        #[arg(short, long, default_value_t = 1.0)]
        amplitude: f64,

        /// Tuning key, long name or menu label
        #[arg(short, long, default_value = "EQ")]
        tuning: Tuning,

        /// Spell note names with flats
        #[arg(long)]
        flats: bool,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Read samples and menu actions from stdin, one per line
    ///
    /// Lines are `<frequency> <amplitude>`, `tuning <name>`, `flats` or `sharps`.
    Stream {
        /// Initial tuning
        #[arg(short, long, default_value = "EQ")]
        tuning: Tuning,

        /// Start with flat note names
        #[arg(long)]
        flats: bool,

        /// Amplitude at or below which samples are ignored
        #[arg(long, default_value_t = retune_core::resolver::AMPLITUDE_GATE)]
        gate: f64,

        /// Output one JSON object per update
        #[arg(long)]
        json: bool,
    },

    /// Print the frequency of a MIDI note on the keyboard
    Key {
        /// MIDI note number
        note: u8,

        /// Keyboard tuning
        #[arg(short, long, default_value = "EQ")]
        tuning: Tuning,
    },

    /// List the tuning catalog
    Tunings,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Resolve { frequency, amplitude, tuning, flats, json } => {
            let style = name_style(flats);
            let sample = NoteSample::new(frequency, amplitude);
            let note = Resolver::default()
                .process(sample, tuning.tuner_table())
                .with_context(|| format!("could not resolve {frequency} Hz under {tuning}"))?;
            match note {
                Some(note) => print_note(&note, &note.display_name(style), json)?,
                None => println!("-"),
            }
        }
        Commands::Stream { tuning, flats, gate, json } => {
            let settings = TunerSettings {
                tuning,
                name_style: name_style(flats),
                amplitude_gate: gate,
            };
            stream(settings, json)?;
        }
        Commands::Key { note, tuning } => {
            let freq = keyboard::frequency_for_note(tuning, note)?;
            println!("{freq:.2} Hz");
        }
        Commands::Tunings => {
            for tuning in Tuning::ALL {
                let table = tuning.tuner_table();
                let range = keyboard::playable_range(tuning);
                println!(
                    "{:<4}{:<18}{:>2} steps  keys {}..={}",
                    tuning.key(),
                    tuning.long_name(),
                    table.len(),
                    range.start(),
                    range.end()
                );
            }
        }
    }
    Ok(())
}

fn name_style(flats: bool) -> NameStyle {
    if flats { NameStyle::Flat } else { NameStyle::Sharp }
}

/// Feeds stdin through a session worker and prints every update.
fn stream(settings: TunerSettings, json: bool) -> Result<()> {
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let (update_tx, update_rx) = crossbeam_channel::unbounded();
    let worker = SessionWorker::spawn(settings, event_rx, update_tx);
    let printer = thread::spawn(move || print_updates(update_rx, json));

    for (number, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        match parse_line(&line) {
            Ok(Some(event)) => event_tx
                .send(event)
                .context("tuner session stopped unexpectedly")?,
            Ok(None) => {}
            Err(e) => log::warn!("line {}: {e:#}", number + 1),
        }
    }
    drop(event_tx);

    worker.join();
    match printer.join() {
        Ok(result) => result,
        Err(_) => bail!("output thread panicked"),
    }
}

fn print_updates(updates: Receiver<TunerDisplay>, json: bool) -> Result<()> {
    for update in updates {
        print_note(&update.note, &update.name, json)?;
    }
    Ok(())
}

fn print_note(note: &ResolvedNote, name: &str, json: bool) -> Result<()> {
    if json {
        let value = TunerDisplay { note: note.clone(), name: name.to_string() };
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{:>8.1} Hz  {:<5} {:+4.0} cents", note.pitch_hz, name, note.cents_deviation);
    }
    Ok(())
}

/// Parses one stdin line into a session event. Blank lines and `#` comments yield `None`.
fn parse_line(line: &str) -> Result<Option<SessionEvent>> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else { return Ok(None) };
    if first.starts_with('#') {
        return Ok(None);
    }

    let event = match first {
        "flats" => SessionEvent::SetNameStyle(NameStyle::Flat),
        "sharps" => SessionEvent::SetNameStyle(NameStyle::Sharp),
        "tuning" => {
            let name = words.next().context("missing tuning name")?;
            SessionEvent::SelectTuning(name.parse()?)
        }
        freq => {
            let frequency: f64 = freq
                .parse()
                .with_context(|| format!("not a frequency: {freq}"))?;
            let amplitude: f64 = match words.next() {
                Some(amp) => amp
                    .parse()
                    .with_context(|| format!("not an amplitude: {amp}"))?,
                None => 1.0,
            };
            SessionEvent::Sample(NoteSample::new(frequency, amplitude))
        }
    };
    Ok(Some(event))
}

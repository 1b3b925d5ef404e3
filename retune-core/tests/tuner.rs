use retune_core::resolver::fold_into_octave;
use retune_core::{
    frequency_for_note, resolve, select_tuning, NameStyle, NoteSample, SessionEvent,
    TunerError, TunerSession, TunerSettings, Tuning,
};

#[test]
fn folding_terminates_for_every_tuning() {
    let frequencies = [0.5, 8.0, 27.5, 31.0, 55.0, 261.63, 440.0, 1975.5, 8000.0, 19_999.0];
    for tuning in Tuning::ALL {
        let table = tuning.tuner_table();
        let lo = table.min().unwrap();
        for f in frequencies {
            let folded = fold_into_octave(f, table).unwrap();
            assert!(folded.frequency >= lo, "{tuning} {f}");
            assert!(folded.frequency < 2.0 * lo, "{tuning} {f}");
            assert_eq!(f / 2f64.powi(folded.octaves), folded.frequency);
        }
    }
}

#[test]
fn a4_under_every_just_tuning_is_named_a() {
    for tuning in Tuning::ALL {
        let note = resolve(NoteSample::new(440.0, 0.4), tuning.tuner_table()).unwrap();
        assert_eq!(note.name_sharp, "A", "{tuning}");
        assert_eq!(note.octave, 4, "{tuning}");
        assert!(note.cents_deviation.abs() <= 20.0, "{tuning}: {}", note.cents_deviation);
    }
}

#[test]
fn guitar_strings_under_equal_temperament() {
    let table = select_tuning("EQ").unwrap();
    let strings = [
        (82.41, "E2"),
        (110.0, "A2"),
        (146.83, "D3"),
        (196.0, "G3"),
        (246.94, "B3"),
        (329.63, "E4"),
    ];
    for (freq, name) in strings {
        let note = resolve(NoteSample::new(freq, 0.5), table).unwrap();
        assert_eq!(note.display_name(NameStyle::Sharp), name);
        assert_eq!(note.cents_deviation, 0.0, "{name}");
    }
}

#[test]
fn settings_parse_from_json() {
    let settings: TunerSettings =
        serde_json::from_str(r#"{"tuning": "Bb", "name_style": "flat"}"#).unwrap();
    assert_eq!(settings.tuning, Tuning::BFlat);
    assert_eq!(settings.name_style, NameStyle::Flat);
    assert_eq!(settings.amplitude_gate, 0.05);

    let err = serde_json::from_str::<TunerSettings>(r#"{"tuning": "Pythagorean"}"#);
    assert!(err.is_err());
}

#[test]
fn session_matches_direct_resolution() {
    let mut session = TunerSession::new(TunerSettings {
        tuning: Tuning::C,
        ..TunerSettings::default()
    });
    let sample = NoteSample::new(392.4, 0.7);
    let direct = resolve(sample, Tuning::C.tuner_table()).unwrap();
    let shown = session.handle(SessionEvent::Sample(sample)).cloned();
    assert_eq!(shown, Some(direct));
}

#[test]
fn keyboard_and_tuner_agree_on_just_a() {
    let freq = frequency_for_note(Tuning::A, 57).unwrap();
    assert_eq!(freq, 220.0);
    let note = resolve(NoteSample::new(freq, 0.5), Tuning::A.tuner_table()).unwrap();
    assert_eq!(note.display_name(NameStyle::Sharp), "A3");
    assert_eq!(note.cents_deviation, 0.0);

    assert!(matches!(
        frequency_for_note(Tuning::A, 47),
        Err(TunerError::NoteOutOfRange { note: 47, .. })
    ));
}

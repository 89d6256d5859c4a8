use pulsegrid_core::{
    AudioSource, MetronomeEngine, OnsetRecord, PulseError, RecordingObserver, ReportInput,
    RhythmRecord, Stage, build_report,
    report::{read_report, write_report},
};

fn sample_input<'a>(quantized: &'a [f64]) -> ReportInput<'a> {
    ReportInput {
        bpm: 120.0,
        confidence: 3.2,
        beats: &[0.5, 1.0, 1.5, 2.0],
        onsets: &[0.52, 1.49, 3.1],
        quantized_onsets: quantized,
        beats_intervals: None,
        bpm_intervals: Some(&[0.5, 0.5, 0.5]),
        sample_rate: 44_100,
        audio_length: 176_400,
    }
}

#[test]
fn report_keys_follow_fixed_order() {
    let report = build_report(&sample_input(&[0.5, 1.5, 3.0])).expect("report should build");
    let json = serde_json::to_string(&report).expect("report should serialize");

    let keys = [
        "\"bpm\"",
        "\"beats\"",
        "\"confidence\"",
        "\"onsets\"",
        "\"quantized_onsets\"",
        "\"beats_intervals\"",
        "\"bpm_intervals\"",
        "\"sample_rate\"",
        "\"audio_duration\"",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|key| json.find(key).expect("key should be present"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{json}");
    assert!(json.contains("\"beats_intervals\":null"));
}

#[test]
fn report_duration_is_length_over_rate() {
    let report = build_report(&sample_input(&[])).expect("report should build");
    assert_eq!(report.audio_duration, 4.0);
    assert!(report.quantized_onsets.is_empty());
}

#[test]
fn report_survives_disk_roundtrip() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let path = temp.path().join("nested").join("song_beat_grid.json");
    let report = build_report(&sample_input(&[0.5, 1.5])).expect("report should build");

    write_report(&path, &report).expect("report should be written");
    let loaded = read_report(&path).expect("report should be read");
    assert_eq!(loaded, report);
}

#[test]
fn non_finite_rhythm_values_are_rejected() {
    let mut input = sample_input(&[0.5]);
    input.bpm = f64::NAN;
    let err = build_report(&input).expect_err("nan bpm must be rejected");
    assert!(matches!(
        err,
        PulseError::InvalidInput {
            stage: Stage::Report,
            field: "bpm",
            ..
        }
    ));

    let estimates = [120.0, f64::INFINITY];
    let mut input = sample_input(&[0.5]);
    input.beats_intervals = Some(&estimates);
    let err = build_report(&input).expect_err("infinite estimate must be rejected");
    assert!(matches!(
        err,
        PulseError::InvalidInput {
            stage: Stage::Report,
            field: "beats_intervals",
            index: 1,
            ..
        }
    ));
}

#[test]
fn engine_refuses_to_report_nan_bpm() {
    let rhythm = RhythmRecord {
        bpm: f64::NAN,
        confidence: 3.0,
        ticks: vec![0.5, 1.0, 1.5],
        bpm_estimates: Some(vec![120.0, f64::NAN]),
        bpm_intervals: None,
    };
    let onsets = OnsetRecord {
        onset_rate: 1.0,
        onsets: vec![0.52],
    };

    let err = MetronomeEngine::default()
        .run(
            &rhythm,
            &onsets,
            AudioSource::Length {
                frames: 44_100 * 2,
                sample_rate: 44_100,
            },
            &mut RecordingObserver::default(),
        )
        .expect_err("non-finite rhythm values must abort");
    assert_eq!(err.stage(), Stage::Report);
}

use pulsegrid_core::{
    EngineSettings, fixtures,
    parity::{demo_parity_report, generate_parity_report, read_parity_report, write_parity_report},
};

#[test]
fn demo_parity_is_deterministic() {
    let first = demo_parity_report().expect("parity report should generate");
    let second = demo_parity_report().expect("parity report should generate");
    assert_eq!(first, second);
    assert_eq!(first.sample_rate, 44_100);
    assert_eq!(first.frames, fixtures::DEMO_DURATION_SECONDS * 44_100);
    assert_eq!(first.quantized_onsets, 3);
    assert!(first.mixed_hash.is_some());
}

#[test]
fn settings_change_shows_up_in_hashes() {
    let baseline = demo_parity_report().expect("parity report should generate");
    let mut settings = EngineSettings::default();
    settings.mix = None;
    settings.render.target_peak = 0.5;
    let variant = generate_parity_report(
        &fixtures::demo_rhythm(),
        &fixtures::demo_onsets(),
        &fixtures::demo_audio(),
        settings,
    )
    .expect("parity report should generate");

    assert!(variant.mixed_hash.is_none());
    assert_ne!(variant.rendered_hash, baseline.rendered_hash);
    assert_eq!(variant.report_hash, baseline.report_hash);
}

#[test]
fn parity_report_roundtrips_through_disk() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let path = temp.path().join("report.json");
    let report = demo_parity_report().expect("parity report should generate");

    write_parity_report(&path, &report).expect("parity report should be written");
    let loaded = read_parity_report(&path).expect("parity report should be read");
    assert_eq!(loaded, report);
}

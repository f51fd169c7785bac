//! Cut engine behavior on randomized event tables.

use pulsefit_rs::cuts::{CutEngine, CutSpec};
use pulsefit_rs::error::PulseFitError;
use pulsefit_rs::events::{Column, EventTable};

use crate::test_helpers::random_events;

/// Indices of events passing every fixed cut in `spec`, evaluated row by row.
fn passing_rows(table: &EventTable, spec: &CutSpec) -> Vec<usize> {
    let zenith = table.zenith_deg().unwrap();
    (0..table.len())
        .filter(|&i| {
            let g = table.column(Column::Gammaness).unwrap()[i];
            let a = table.column(Column::Alpha).unwrap()[i];
            let t = table.column(Column::Theta2).unwrap()[i];
            let inten = table.column(Column::Intensity).unwrap()[i];
            let e = table.energy()[i];
            spec.gammaness_cut.as_ref().map_or(true, |c| g > c.scalar().unwrap())
                && spec.alpha_cut.as_ref().map_or(true, |c| a < c.scalar().unwrap())
                && spec.theta2_cut.as_ref().map_or(true, |c| t < c.scalar().unwrap())
                && spec.zenith_cut.map_or(true, |(lo, hi)| zenith[i] >= lo && zenith[i] <= hi)
                && spec.intensity_cut.map_or(true, |c| inten > c)
                && spec.energy_cut.map_or(true, |(lo, hi)| e >= lo && e <= hi)
        })
        .collect()
}

#[test]
fn test_fixed_cuts_keep_exactly_the_passing_events() {
    let specs = vec![
        CutSpec::new().gammaness(0.6),
        CutSpec::new().alpha(12.0).theta2(0.1),
        CutSpec::new().zenith(0.0, 35.0).intensity(80.0),
        CutSpec::new().energy(0.05, 3.0),
        CutSpec::new()
            .gammaness(0.3)
            .alpha(30.0)
            .theta2(0.3)
            .zenith(5.0, 60.0)
            .intensity(20.0)
            .energy(0.02, 50.0),
        CutSpec::new(),
    ];

    for (seed, spec) in specs.into_iter().enumerate() {
        let original = random_events(2_000, seed as u64);
        let expected_rows = passing_rows(&original, &spec);
        let expected_times: Vec<f64> = expected_rows.iter().map(|&i| original.time()[i]).collect();

        let mut table = original.clone();
        CutEngine::new(spec.clone()).unwrap().apply_fixed_cut(&mut table).unwrap();

        assert_eq!(table.time(), expected_times.as_slice(), "spec {:?}", spec);
        assert!(table.is_time_ordered());
        assert!(table.len() <= original.len());
    }
}

#[test]
fn test_energy_dependent_cuts_use_each_bins_threshold() {
    let binning = vec![0.01, 0.1, 1.0, 10.0, 100.0];
    let g_cuts = [0.3, 0.5, 0.7, 0.8];
    let a_cuts = [25.0, 15.0, 10.0, 8.0];
    let spec = CutSpec::new()
        .energy_binning(binning.clone())
        .gammaness(g_cuts.to_vec())
        .alpha(a_cuts.to_vec())
        .theta2(0.2);

    let original = random_events(4_000, 99);
    let mut table = original.clone();
    CutEngine::new(spec).unwrap().apply(&mut table).unwrap();

    assert!(table.is_time_ordered());
    let bin_of = |e: f64| binning.windows(2).position(|w| e >= w[0] && e < w[1]);

    let expected = (0..original.len())
        .filter(|&i| {
            let Some(bin) = bin_of(original.energy()[i]) else {
                return false;
            };
            original.column(Column::Gammaness).unwrap()[i] > g_cuts[bin]
                && original.column(Column::Alpha).unwrap()[i] < a_cuts[bin]
                && original.column(Column::Theta2).unwrap()[i] < 0.2
        })
        .count();
    assert_eq!(table.len(), expected);

    for i in 0..table.len() {
        let bin = bin_of(table.energy()[i]).unwrap();
        assert!(table.column(Column::Gammaness).unwrap()[i] > g_cuts[bin]);
        assert!(table.column(Column::Alpha).unwrap()[i] < a_cuts[bin]);
    }
}

#[test]
fn test_invalid_thresholds_are_rejected_with_context() {
    let err = CutEngine::new(CutSpec::new().gammaness(1.0)).unwrap_err();
    match err {
        PulseFitError::InvalidCut { cut, value, .. } => {
            assert_eq!(cut, "gammaness_cut");
            assert_eq!(value, "1");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(CutEngine::new(CutSpec::new().zenith(10.0, 95.0)).is_err());
    assert!(CutEngine::new(CutSpec::new().alpha(-1.0)).is_err());
    assert!(CutEngine::new(CutSpec::new().gammaness(0.0)).is_ok());
    assert!(CutEngine::new(CutSpec::new().zenith(0.0, 90.0)).is_ok());
}

#[test]
fn test_per_bin_cuts_need_a_matching_binning() {
    assert!(CutEngine::new(CutSpec::new().gammaness(vec![0.5, 0.6])).is_err());
    assert!(CutEngine::new(
        CutSpec::new()
            .energy_binning(vec![0.1, 1.0, 10.0])
            .gammaness(vec![0.5, 0.6, 0.7])
    )
    .is_err());

    let engine = CutEngine::new(CutSpec::new().gammaness(0.5)).unwrap();
    let mut table = random_events(10, 1);
    assert!(matches!(
        engine.apply_energydep_cuts(&mut table),
        Err(PulseFitError::MissingEnergyBinning)
    ));
    assert_eq!(table.len(), 10);
}

#[test]
fn test_deferred_domain_check_leaves_table_untouched() {
    // With a binning configured, domains are checked when the cuts run.
    let engine = CutEngine::new(
        CutSpec::new()
            .energy_binning(vec![0.01, 1.0, 100.0])
            .gammaness(vec![0.5, 1.5]),
    )
    .unwrap();
    let mut table = random_events(50, 3);
    assert!(matches!(
        engine.apply_energydep_cuts(&mut table),
        Err(PulseFitError::InvalidCut { .. })
    ));
    assert!(engine.apply(&mut table).is_err());
    assert_eq!(table.len(), 50);
}

#[test]
fn test_missing_column_is_reported() {
    let mut table = EventTable::new(vec![0.0, 1.0], vec![0.2, 0.4], vec![1.0, 2.0]).unwrap();
    let engine = CutEngine::new(CutSpec::new().theta2(0.1)).unwrap();
    assert!(matches!(
        engine.apply_fixed_cut(&mut table),
        Err(PulseFitError::MissingColumn("theta2"))
    ));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_chunked_merge_restores_time_order() {
    let whole = random_events(300, 8);
    let parts: Vec<EventTable> = (0..6)
        .rev()
        .map(|k| whole.take(&(k * 50..(k + 1) * 50).collect::<Vec<_>>()))
        .collect();
    let merged = EventTable::concat_chunked(parts, 4).unwrap();
    assert_eq!(merged.len(), 300);
    assert!(merged.is_time_ordered());
    assert_eq!(merged.time(), whole.time());
    assert!(merged.column(Column::Alpha).is_some());
}

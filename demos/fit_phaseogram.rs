//! Example of the full phaseogram pipeline.
//!
//! Simulates a two-peak pulsar on top of hadronic background, applies
//! energy-dependent gammaness cuts, and fits the light curve both binned and
//! unbinned. Set `RUST_LOG=pulsefit_rs=debug` to see the pipeline's log.

use pulsefit_rs::config::AnalysisConfig;
use pulsefit_rs::events::{Column, EventTable};
use pulsefit_rs::fitting::FitMode;
use pulsefit_rs::logging::scoped_subscriber;
use pulsefit_rs::models::PeakModel;
use pulsefit_rs::synthetic::sample_phases;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CONFIG: &str = r#"{
    "cuts": {
        "energy_binning": [0.02, 0.2, 2.0, 20.0],
        "gammaness_cut": [0.5, 0.6, 0.7],
        "zenith_cut": [0.0, 50.0]
    },
    "fit": { "model": "dgaussian", "peak": "both" },
    "regions": {
        "P1": [0.05, 0.15],
        "P2": [0.45, 0.65],
        "OFF": [0.7, 0.95]
    },
    "n_bins": 100
}"#;

fn simulate(rng: &mut ChaCha8Rng) -> Result<EventTable, Box<dyn std::error::Error>> {
    let pulsar = [0.1, 0.02, 0.55, 0.03, 0.0, 4000.0, 6000.0];
    let mut phase = sample_phases(PeakModel::DoubleGaussian, &pulsar, 10_000, rng)?;
    let mut gammaness: Vec<f64> = phase.iter().map(|_| rng.gen_range(0.55..1.0)).collect();
    for _ in 0..40_000 {
        phase.push(rng.gen());
        gammaness.push(rng.gen::<f64>().powi(2));
    }

    let n = phase.len();
    let mut time: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..3600.0)).collect();
    time.sort_by(f64::total_cmp);
    let energy = (0..n).map(|_| 10f64.powf(rng.gen_range(-1.5..1.2))).collect();
    let altitude = (0..n).map(|_| rng.gen_range(0.6..1.5)).collect();

    Ok(EventTable::new(time, phase, energy)?
        .with_column(Column::Gammaness, gammaness)?
        .with_column(Column::Altitude, altitude)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = scoped_subscriber("pulsefit_rs=info");

    println!("Phaseogram fitting example");
    println!("==========================\n");

    let config = AnalysisConfig::from_json_str(CONFIG)?;
    let mut rng = ChaCha8Rng::seed_from_u64(2019);
    let mut events = simulate(&mut rng)?;
    println!("Simulated {} events", events.len());

    let engine = config.cut_engine()?;
    engine.apply(&mut events)?;
    println!("{} events survive the cuts\n", events.len());

    let data = config.phaseogram(events.phase().to_vec())?;
    for name in data.regions.peak_names() {
        if let Some(region) = data.regions.get(name) {
            println!("{}: Nex = {:.1}, Noff = {:.1}", name, region.nex, region.noff);
        }
    }
    println!();

    for mode in [FitMode::Binned, FitMode::Unbinned] {
        let mut settings = config.fit.clone();
        settings.binned = mode == FitMode::Binned;
        let mut fitter = settings.build()?;
        let result = fitter.run(&data)?;
        println!("{}", result);
        for name in ["mu", "mu_2"] {
            if let Some(phase) = result.folded(name) {
                println!("  {} folded into [0, 1): {:.4}", name, phase);
            }
        }
        println!();
    }

    Ok(())
}

//! Smoke Prediction Tool
//!
//! Loads the configured DT model and runs random in-range well log
//! readings through it.
//!
//! Usage: smoke_predict [--write-demo] [--count N] [--model PATH]

use anyhow::{bail, Context, Result};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use well_log_dt::{
    config::AppConfig,
    models::{ModelLoader, ModelService, NativeModel},
    types::{Feature, FeatureVector},
    ServiceError,
};

struct Args {
    count: usize,
    model: Option<PathBuf>,
    write_demo: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args {
            count: 10,
            model: None,
            write_demo: false,
        };

        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--write-demo" => args.write_demo = true,
                "--count" => {
                    let value = iter.next().context("--count needs a value")?;
                    args.count = value
                        .parse()
                        .with_context(|| format!("Invalid count: {}", value))?;
                }
                "--model" => {
                    let value = iter.next().context("--model needs a path")?;
                    args.model = Some(PathBuf::from(value));
                }
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(args)
    }
}

/// Random well log readings inside each feature's accepted range
struct ReadingGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ReadingGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn generate(&mut self) -> FeatureVector {
        let mut features = FeatureVector::default();
        for feature in Feature::ALL {
            let (min, max) = feature.range();
            let step = feature.step();
            let steps = ((max - min) / step).round() as u64;
            let value = min + self.rng.gen_range(0..=steps) as f64 * step;
            features.set(feature, value.min(max));
        }
        features
    }
}

fn write_demo_model(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = NativeModel::demo().to_json_pretty()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Demo model written");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smoke_predict=info".parse()?)
                .add_directive("well_log_dt=info".parse()?),
        )
        .init();

    let args = Args::parse()?;
    let mut config = AppConfig::load()?;
    if let Some(model) = args.model {
        config.model.path = model;
    }

    let model_path = config.model.resolved_path();
    if args.write_demo {
        write_demo_model(&model_path)?;
    }

    let service = ModelService::eager(ModelLoader::from_config(&config.model)?);
    let Some(handle) = service.handle() else {
        bail!("No model could be loaded from {}", model_path.display());
    };
    info!(
        strategy = handle.strategy(),
        path = %handle.path().display(),
        "Model loaded, running {} predictions",
        args.count
    );

    let mut generator = ReadingGenerator::new();
    let mut failures = 0usize;
    let mut total_dt = 0.0;
    let start = Instant::now();

    for i in 0..args.count {
        let features = generator.generate();
        match service.predict(&features) {
            Ok(report) => {
                total_dt += report.predicted_dt;
                info!(
                    n = i + 1,
                    rhob = ?features.get(Feature::Rhob),
                    gr = ?features.get(Feature::Gr),
                    nphi = ?features.get(Feature::Nphi),
                    pef = ?features.get(Feature::Pef),
                    "{}",
                    report.message()
                );
            }
            Err(ServiceError::InvalidInput(errors)) => {
                failures += 1;
                for err in errors {
                    warn!(n = i + 1, "{}", err);
                }
            }
            Err(e) => {
                failures += 1;
                warn!(n = i + 1, error = %e, "Prediction failed");
            }
        }
    }

    let succeeded = args.count - failures;
    let elapsed = start.elapsed();
    info!("Done! {} predictions in {:.2?}", succeeded, elapsed);
    if succeeded > 0 {
        info!("Mean predicted DT: {:.2} µs/ft", total_dt / succeeded as f64);
    }

    if failures > 0 {
        bail!("{} of {} predictions failed", failures, args.count);
    }
    Ok(())
}

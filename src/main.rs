//! rocket-ts — ROCKET feature transform for time series.
//!
//! CLI demo: builds a synthetic multi-class dataset, fits a
//! `RocketClassifier` and reports accuracy and timing.

use std::time::Instant;

use clap::Parser;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rocket_ts::pipeline::{RocketClassifier, RocketClassifierConfig};
use rocket_ts::transform::Backend;

/// rocket-ts demo CLI.
#[derive(Parser, Debug)]
#[command(
    name = "rocket-ts",
    about = "ROCKET — random convolutional kernel transform for time series",
    version
)]
struct Cli {
    /// Number of random kernels (two features each).
    #[arg(short = 'k', long, default_value_t = 1_000)]
    num_kernels: usize,

    /// Sequence length of the synthetic series.
    #[arg(long, default_value_t = 150)]
    seq_len: usize,

    /// Number of series in the training split.
    #[arg(long, default_value_t = 96)]
    batch: usize,

    /// Channels per series.
    #[arg(long, default_value_t = 1)]
    channels: usize,

    /// Number of classes in the synthetic dataset.
    #[arg(long, default_value_t = 3)]
    classes: usize,

    /// Seed for data generation and kernel generation.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Disable kernel dilation.
    #[arg(long, default_value_t = false)]
    no_dilation: bool,

    /// Disable kernel padding.
    #[arg(long, default_value_t = false)]
    no_padding: bool,

    /// Evaluator backend: serial | parallel.
    #[arg(long, default_value = "parallel")]
    backend: String,
}

/// Class-dependent sine plus noise, one label per series.
fn synthetic_dataset(
    batch: usize,
    channels: usize,
    seq_len: usize,
    classes: usize,
    seed: u64,
) -> (Array3<f64>, Vec<i64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array3::zeros((batch, channels, seq_len));
    let mut y = Vec::with_capacity(batch);
    for i in 0..batch {
        let class = i % classes;
        y.push(class as i64);
        let freq = 0.2 + 0.3 * class as f64;
        let amp = 1.0 + 0.5 * class as f64;
        for c in 0..channels {
            for t in 0..seq_len {
                let noise: f64 = rng.gen_range(-0.3..0.3);
                x[[i, c, t]] = amp * (t as f64 * freq + c as f64).sin() + noise;
            }
        }
    }
    (x, y)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    tracing::info!("rocket-ts v{}", env!("CARGO_PKG_VERSION"));

    let backend: Backend = cli.backend.parse()?;
    tracing::info!(
        "Config: {} kernels, seq_len={}, {} channels, {} classes, backend={}",
        cli.num_kernels,
        cli.seq_len,
        cli.channels,
        cli.classes,
        backend,
    );

    let (x_train, y_train) =
        synthetic_dataset(cli.batch, cli.channels, cli.seq_len, cli.classes, cli.seed);
    let (x_test, y_test) = synthetic_dataset(
        cli.batch / 2,
        cli.channels,
        cli.seq_len,
        cli.classes,
        cli.seed.wrapping_add(1),
    );

    let mut clf = RocketClassifier::new(RocketClassifierConfig {
        num_kernels: cli.num_kernels,
        seed: Some(cli.seed),
        backend,
        use_dilation: !cli.no_dilation,
        use_padding: !cli.no_padding,
        ..RocketClassifierConfig::default()
    });

    let t0 = Instant::now();
    clf.fit(x_train.view(), &y_train)?;
    let fit_ms = t0.elapsed().as_secs_f64() * 1e3;
    tracing::info!("Fitted {} series in {:.1} ms", cli.batch, fit_ms);

    let t1 = Instant::now();
    let train_acc = clf.score(x_train.view(), &y_train)?;
    let test_acc = clf.score(x_test.view(), &y_test)?;
    let score_ms = t1.elapsed().as_secs_f64() * 1e3;

    tracing::info!("Train accuracy: {:.3}", train_acc);
    tracing::info!("Test accuracy:  {:.3}", test_acc);
    tracing::info!(
        "Scored {} series in {:.1} ms",
        cli.batch + cli.batch / 2,
        score_ms
    );

    Ok(())
}

#![recursion_limit = "256"]

use std::path::PathBuf;

use burn::{backend::Autodiff, config::Config};
use clap::Parser;
use mnist_fullconv::{
    artifact::Artifacts,
    dataset::MnistSource,
    logging,
    training::{self, ExperimentOptions, TrainingConfig},
};

#[cfg(not(any(feature = "ndarray", feature = "wgpu")))]
compile_error!("Enable the `ndarray` or `wgpu` feature to select a backend.");

#[cfg(feature = "wgpu")]
mod backend {
    use burn::backend::wgpu::{Wgpu, WgpuDevice};

    pub type Backend = Wgpu;

    pub fn device() -> WgpuDevice {
        WgpuDevice::default()
    }
}

#[cfg(all(feature = "ndarray", not(feature = "wgpu")))]
mod backend {
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    pub type Backend = NdArray;

    pub fn device() -> NdArrayDevice {
        NdArrayDevice::Cpu
    }
}

/// Trains a fully convolutional classifier on MNIST and plots its learning curves.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON training config; the flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    num_epochs: Option<usize>,
    #[arg(short, long)]
    batch_size: Option<usize>,
    #[arg(short, long)]
    learning_rate: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    num_workers: Option<usize>,
    #[arg(long)]
    dropout: Option<f64>,
    /// Directory holding the MNIST IDX files instead of downloading them.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Only train on the first N training samples.
    #[arg(long)]
    train_limit: Option<usize>,
    /// Only evaluate on the first N test samples.
    #[arg(long)]
    test_limit: Option<usize>,
    /// Where to save the config, trained weights, history, charts and logs.
    /// The directory is wiped first.
    #[arg(short, long)]
    artifact_dir: Option<PathBuf>,
    /// Skip printing the charts.
    #[arg(long)]
    no_plot: bool,
}

impl Args {
    fn training_config(&self) -> mnist_fullconv::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::load(path)?,
            None => TrainingConfig::new(),
        };

        if let Some(num_epochs) = self.num_epochs {
            config.num_epochs = num_epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(num_workers) = self.num_workers {
            config.num_workers = num_workers;
        }
        if let Some(dropout) = self.dropout {
            config.model.dropout = dropout;
        }
        config.validate()?;

        Ok(config)
    }

    fn experiment_options(&self) -> ExperimentOptions {
        ExperimentOptions {
            source: self
                .data_dir
                .clone()
                .map(MnistSource::Directory)
                .unwrap_or(MnistSource::Download),
            train_limit: self.train_limit,
            test_limit: self.test_limit,
            artifact_dir: self.artifact_dir.clone(),
            plot: !self.no_plot,
        }
    }
}

fn main() {
    let args = Args::parse();
    let options = args.experiment_options();

    let log_path = match &options.artifact_dir {
        Some(dir) => match Artifacts::create(dir) {
            Ok(artifacts) => Some(artifacts.log_path()),
            Err(err) => {
                eprintln!("Can't prepare the artifact directory: {err}");
                std::process::exit(1);
            }
        },
        None => None,
    };
    logging::install(log_path.as_deref());

    let result = args.training_config().and_then(|config| {
        log::info!("Training config: {config}");
        training::run::<Autodiff<backend::Backend>>(config, &options, backend::device())
    });

    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

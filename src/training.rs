// Trains the fully convolutional classifier with a hand-written loop: every epoch
// runs one optimizer step per training batch, then scores the test split with
// the autodiff-free copy of the model. Metrics are reset at each epoch boundary
// and the per-epoch means end up in the returned history.

use std::{path::PathBuf, sync::Arc};

use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::{
    artifact::Artifacts,
    data::{MnistBatch, MnistBatcher},
    dataset::{MnistSource, MnistSplit, Split},
    history::{EpochMetrics, History},
    metric::{AccuracyInput, AccuracyMetric, MeanMetric, Metric, Numeric},
    model::{Model, ModelConfig},
    plot::TextPlot,
};

#[derive(Config)]
pub struct TrainingConfig {
    #[config(default = "ModelConfig::new()")]
    pub model: ModelConfig,
    #[config(default = "AdamConfig::new()")]
    pub optimizer: AdamConfig,
    #[config(default = 20)]
    pub num_epochs: usize,
    #[config(default = 32)]
    pub batch_size: usize,
    #[config(default = 4)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
}

impl TrainingConfig {
    /// Rejects values the layers and the data loader would panic on.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |reason: String| Err(crate::Error::InvalidConfig(reason));

        if self.batch_size == 0 {
            return invalid("batch size must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&self.model.dropout) {
            return invalid(format!(
                "dropout must be in [0, 1), got {}",
                self.model.dropout
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            ));
        }

        Ok(())
    }
}

/// Returns whether `loss` is finite, warning when it is not.
pub(crate) fn check_loss(name: &str, loss: f64) -> bool {
    let finite = loss.is_finite();
    if !finite {
        log::warn!("{name} is not finite: {loss}");
    }
    finite
}

/// Owns the model being trained, its optimizer and the four running metrics.
pub struct Trainer<B: AutodiffBackend, O> {
    model: Model<B>,
    optim: O,
    learning_rate: f64,
    train_loss: MeanMetric,
    train_accuracy: AccuracyMetric<B::InnerBackend>,
    test_loss: MeanMetric,
    test_accuracy: AccuracyMetric<B::InnerBackend>,
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Model<B>, B>,
{
    pub fn new(model: Model<B>, optim: O, learning_rate: f64) -> Self {
        Self {
            model,
            optim,
            learning_rate,
            train_loss: MeanMetric::new("train_loss"),
            train_accuracy: AccuracyMetric::new("train_accuracy"),
            test_loss: MeanMetric::new("test_loss"),
            test_accuracy: AccuracyMetric::new("test_accuracy"),
        }
    }

    pub fn model(&self) -> &Model<B> {
        &self.model
    }

    pub fn into_model(self) -> Model<B> {
        self.model
    }

    pub fn reset_metrics(&mut self) {
        self.train_loss.clear();
        self.train_accuracy.clear();
        self.test_loss.clear();
        self.test_accuracy.clear();
    }

    /// One optimizer step on a batch. Returns the batch loss.
    pub fn train_step(&mut self, batch: MnistBatch<B>) -> f64 {
        let output = self
            .model
            .forward_classification(batch.images, batch.targets);

        // Gradients linked to each parameter of the model.
        let grads = GradientsParams::from_grads(output.loss.backward(), &self.model);
        self.model = self
            .optim
            .step(self.learning_rate, self.model.clone(), grads);

        let loss = output.loss.into_scalar().elem::<f64>();
        check_loss("Training loss", loss);

        self.train_loss.update(&loss);
        self.train_accuracy.update(&AccuracyInput::new(
            output.output.inner(),
            output.targets.inner(),
        ));

        loss
    }

    /// Scores a test batch with `model`, the autodiff-free copy of the trained model.
    pub fn test_step(
        &mut self,
        model: &Model<B::InnerBackend>,
        batch: MnistBatch<B::InnerBackend>,
    ) -> f64 {
        let output = model.forward_classification(batch.images, batch.targets);
        let loss = output.loss.into_scalar().elem::<f64>();
        check_loss("Test loss", loss);

        self.test_loss.update(&loss);
        self.test_accuracy
            .update(&AccuracyInput::new(output.output, output.targets));

        loss
    }

    pub fn epoch_metrics(&self, epoch: usize) -> EpochMetrics {
        EpochMetrics::new(
            epoch,
            self.train_loss.value(),
            self.train_accuracy.value(),
            self.test_loss.value(),
            self.test_accuracy.value(),
        )
    }
}

/// Trains a fresh model on `dataset_train`, evaluating on `dataset_test` after each epoch.
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    dataset_train: MnistSplit,
    dataset_test: MnistSplit,
    device: B::Device,
) -> (Model<B>, History) {
    B::seed(config.seed);

    let dataloader_train: Arc<dyn DataLoader<B, MnistBatch<B>>> =
        DataLoaderBuilder::new(MnistBatcher::default())
            .batch_size(config.batch_size)
            .shuffle(config.seed)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(dataset_train);

    let dataloader_test: Arc<dyn DataLoader<B::InnerBackend, MnistBatch<B::InnerBackend>>> =
        DataLoaderBuilder::new(MnistBatcher::default())
            .batch_size(config.batch_size)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(dataset_test);

    let model = config.model.init::<B>(&device);
    let optim = config.optimizer.init::<B, Model<B>>();
    let mut trainer = Trainer::new(model, optim, config.learning_rate);
    let mut history = History::default();

    for epoch in 1..config.num_epochs + 1 {
        trainer.reset_metrics();

        log::info!("Executing training step for epoch {epoch}");
        for batch in dataloader_train.iter() {
            trainer.train_step(batch);
        }

        log::info!("Executing test step for epoch {epoch}");
        let model_test = trainer.model().valid();
        for batch in dataloader_test.iter() {
            trainer.test_step(&model_test, batch);
        }

        let metrics = trainer.epoch_metrics(epoch);
        println!("{metrics}");
        log::info!("{metrics}");
        history.push(metrics);
    }

    (trainer.into_model(), history)
}

/// Everything about a run that is not a hyperparameter.
#[derive(Debug, Clone)]
pub struct ExperimentOptions {
    pub source: MnistSource,
    pub train_limit: Option<usize>,
    pub test_limit: Option<usize>,
    pub artifact_dir: Option<PathBuf>,
    pub plot: bool,
}

impl Default for ExperimentOptions {
    fn default() -> Self {
        Self {
            source: MnistSource::Download,
            train_limit: None,
            test_limit: None,
            artifact_dir: None,
            plot: true,
        }
    }
}

/// Runs a whole experiment, from loading the splits to exporting the artifacts.
pub fn run<B: AutodiffBackend>(
    config: TrainingConfig,
    options: &ExperimentOptions,
    device: B::Device,
) -> crate::Result<History> {
    config.validate()?;

    let dataset_train = options.source.load(Split::Train, options.train_limit)?;
    let dataset_test = options.source.load(Split::Test, options.test_limit)?;

    println!("{} training samples", dataset_train.len());
    println!("{} test samples", dataset_test.len());

    let artifacts = options
        .artifact_dir
        .as_ref()
        .map(Artifacts::open)
        .transpose()?;
    if let Some(artifacts) = &artifacts {
        artifacts.save_config(&config)?;
    }

    let (model, history) = train::<B>(&config, dataset_train, dataset_test, device);

    println!("{}", history.summary());

    let charts = [TextPlot::accuracy(&history), TextPlot::loss(&history)];
    if options.plot {
        for chart in charts.iter() {
            println!("{}", chart.render());
        }
    }

    if let Some(artifacts) = &artifacts {
        artifacts.save_model(model)?;
        artifacts.save_history(&history)?;
        artifacts.save_charts(&charts)?;
        log::info!("Artifacts written to {}", artifacts.dir().display());
    }

    Ok(history)
}

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use burn::{
    config::Config,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};

use crate::{
    error::Result, history::History, model::Model, plot::TextPlot, training::TrainingConfig,
};

/// Output directory of a training run.
#[derive(Debug, Clone)]
pub struct Artifacts {
    dir: PathBuf,
}

impl Artifacts {
    /// Creates the directory, removing the artifacts of a previous run.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::remove_dir_all(dir.as_ref()).ok();
        Self::open(dir)
    }

    /// Uses the directory as is, creating it when missing.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join("model")
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join("history.json")
    }

    /// File holding the experiment logs.
    pub fn log_path(&self) -> PathBuf {
        self.dir.join("experiment.log")
    }

    pub fn save_config(&self, config: &TrainingConfig) -> Result<()> {
        config.save(self.config_path())?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainingConfig> {
        Ok(TrainingConfig::load(self.config_path())?)
    }

    /// Saves the trained weights with the compact (half precision) recorder.
    pub fn save_model<B: Backend>(&self, model: Model<B>) -> Result<()> {
        model.save_file(self.model_path(), &CompactRecorder::new())?;
        Ok(())
    }

    /// Loads weights saved by [save_model](Self::save_model) into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model: Model<B>,
        device: &B::Device,
    ) -> Result<Model<B>> {
        let record = CompactRecorder::new().load(self.model_path(), device)?;
        Ok(model.load_record(record))
    }

    pub fn save_history(&self, history: &History) -> Result<()> {
        let writer = BufWriter::new(File::create(self.history_path())?);
        serde_json::to_writer_pretty(writer, history)?;
        Ok(())
    }

    pub fn load_history(&self) -> Result<History> {
        let reader = File::open(self.history_path())?;
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_charts(&self, charts: &[TextPlot; 2]) -> Result<()> {
        let [accuracy, loss] = charts;
        fs::write(self.dir.join("accuracy.txt"), accuracy.render())?;
        fs::write(self.dir.join("loss.txt"), loss.render())?;
        Ok(())
    }
}

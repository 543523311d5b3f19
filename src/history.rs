use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Metrics measured over one epoch.
#[derive(new, Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub test_loss: f64,
    pub test_accuracy: f64,
}

impl Display for EpochMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Epoch {}, Loss: {}, Accuracy: {}, Test Loss: {}, Test Accuracy: {}",
            self.epoch, self.train_loss, self.train_accuracy, self.test_loss, self.test_accuracy
        )
    }
}

/// Per-epoch metric series, one entry per completed epoch.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct History {
    pub train_acc: Vec<f64>,
    pub train_loss: Vec<f64>,
    pub test_acc: Vec<f64>,
    pub test_loss: Vec<f64>,
}

impl History {
    pub fn push(&mut self, metrics: EpochMetrics) {
        self.train_acc.push(metrics.train_accuracy);
        self.train_loss.push(metrics.train_loss);
        self.test_acc.push(metrics.test_accuracy);
        self.test_loss.push(metrics.test_loss);
    }

    pub fn num_epochs(&self) -> usize {
        self.train_acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_epochs() == 0
    }

    pub fn last(&self) -> Option<EpochMetrics> {
        let index = self.num_epochs().checked_sub(1)?;

        Some(EpochMetrics {
            epoch: self.num_epochs(),
            train_loss: self.train_loss[index],
            train_accuracy: self.train_acc[index],
            test_loss: self.test_loss[index],
            test_accuracy: self.test_acc[index],
        })
    }

    /// Final results, accuracies as percentages.
    pub fn summary(&self) -> String {
        let Some(last) = self.last() else {
            return "No epoch completed".to_string();
        };
        let epochs = last.epoch;

        format!(
            "Training accuracy after {epochs} epochs: {:.6}%\n\
             Test accuracy after {epochs} epochs: {:.6}%\n\
             Training loss after {epochs} epochs: {:.6}\n\
             Test loss after {epochs} epochs: {:.6}",
            last.train_accuracy * 100.0,
            last.test_accuracy * 100.0,
            last.train_loss,
            last.test_loss,
        )
    }
}

use textplots::{Chart, Plot, Shape};

use crate::history::History;

const WIDTH: u32 = 120;
const HEIGHT: u32 = 40;

/// Train and test curves of a single metric over epochs.
pub struct TextPlot {
    title: &'static str,
    y_label: &'static str,
    train: Vec<(f32, f32)>,
    test: Vec<(f32, f32)>,
}

impl TextPlot {
    pub fn new(title: &'static str, y_label: &'static str, train: &[f64], test: &[f64]) -> Self {
        Self {
            title,
            y_label,
            train: points(train),
            test: points(test),
        }
    }

    pub fn accuracy(history: &History) -> Self {
        Self::new(
            "Model accuracy",
            "Accuracy",
            &history.train_acc,
            &history.test_acc,
        )
    }

    pub fn loss(history: &History) -> Self {
        Self::new("Model loss", "Loss", &history.train_loss, &history.test_loss)
    }

    pub fn render(&self) -> String {
        let header = format!(
            "{}\n{} by epoch | Train: line, Test: points\n",
            self.title, self.y_label
        );

        let num_epochs = self.train.len().max(self.test.len());
        if num_epochs == 0 {
            return header + "(no data)\n\n";
        }

        let train = Shape::Lines(&self.train);
        let test = Shape::Points(&self.test);
        let mut chart = Chart::new(WIDTH, HEIGHT, 0.0, num_epochs as f32);
        let chart = chart.lineplot(&train).lineplot(&test);
        chart.axis();
        chart.figures();

        header + &chart.to_string() + "\nEpoch\n\n"
    }
}

fn points(values: &[f64]) -> Vec<(f32, f32)> {
    values
        .iter()
        .enumerate()
        .map(|(epoch, value)| (epoch as f32, *value as f32))
        .collect()
}

use core::marker::PhantomData;

use burn::tensor::{backend::Backend, ElementConversion, Int, Tensor};

/// A metric accumulated batch after batch until cleared.
pub trait Metric {
    type Input;

    fn update(&mut self, item: &Self::Input);
    fn clear(&mut self);
    fn name(&self) -> &'static str;
}

pub trait Numeric {
    fn value(&self) -> f64;
}

/// Running unweighted mean, used for the per-epoch loss.
pub struct MeanMetric {
    name: &'static str,
    total: f64,
    count: usize,
}

impl MeanMetric {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            total: 0.0,
            count: 0,
        }
    }
}

impl Metric for MeanMetric {
    type Input = f64;

    fn update(&mut self, value: &f64) {
        self.total += value;
        self.count += 1;
    }

    fn clear(&mut self) {
        self.total = 0.0;
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl Numeric for MeanMetric {
    fn value(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }

        self.total / self.count as f64
    }
}

/// The [accuracy metric](AccuracyMetric) input type.
#[derive(new)]
pub struct AccuracyInput<B: Backend> {
    outputs: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
}

/// Sparse categorical accuracy: the fraction of samples whose highest logit
/// is the target class.
pub struct AccuracyMetric<B: Backend> {
    name: &'static str,
    correct: usize,
    total: usize,
    _b: PhantomData<B>,
}

impl<B: Backend> AccuracyMetric<B> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            correct: 0,
            total: 0,
            _b: PhantomData,
        }
    }
}

impl<B: Backend> Metric for AccuracyMetric<B> {
    type Input = AccuracyInput<B>;

    fn update(&mut self, input: &AccuracyInput<B>) {
        let [batch_size, _n_classes] = input.outputs.dims();

        let predictions = input.outputs.clone().argmax(1).reshape([batch_size]);
        let correct = predictions
            .equal(input.targets.clone())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        self.correct += correct as usize;
        self.total += batch_size;
    }

    fn clear(&mut self) {
        self.correct = 0;
        self.total = 0;
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<B: Backend> Numeric for AccuracyMetric<B> {
    fn value(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        self.correct as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;

    #[test]
    fn mean_is_unweighted_over_updates() {
        let mut metric = MeanMetric::new("train_loss");

        metric.update(&2.0);
        metric.update(&1.0);
        metric.update(&0.0);

        assert_eq!(metric.value(), 1.0);
        assert_eq!(metric.name(), "train_loss");
    }

    #[test]
    fn mean_reads_zero_when_cleared() {
        let mut metric = MeanMetric::new("test_loss");
        metric.update(&4.0);

        metric.clear();

        assert_eq!(metric.value(), 0.0);
    }

    #[test]
    fn accuracy_accumulates_over_batches() {
        let device = Default::default();
        let mut metric = AccuracyMetric::<TestBackend>::new("train_accuracy");

        metric.update(&AccuracyInput::new(
            Tensor::from_data(
                [
                    [0.0, 0.2, 0.8], // 2
                    [1.0, 2.0, 0.5], // 1
                    [0.4, 0.1, 0.2], // 0
                    [0.6, 0.7, 0.2], // 1
                ],
                &device,
            ),
            Tensor::from_data([2, 2, 1, 1], &device),
        ));
        assert_eq!(metric.value(), 0.5);

        metric.update(&AccuracyInput::new(
            Tensor::from_data([[0.1, 0.9, 0.0], [0.3, 0.2, 0.1]], &device),
            Tensor::from_data([1, 0], &device),
        ));
        assert_eq!(metric.value(), 4.0 / 6.0);
    }

    #[test]
    fn accuracy_stays_in_unit_range() {
        let device = Default::default();
        let mut metric = AccuracyMetric::<TestBackend>::new("test_accuracy");
        assert_eq!(metric.value(), 0.0);

        metric.update(&AccuracyInput::new(
            Tensor::from_data([[0.0, 1.0], [1.0, 0.0]], &device),
            Tensor::from_data([1, 0], &device),
        ));
        assert_eq!(metric.value(), 1.0);

        metric.clear();
        assert_eq!(metric.value(), 0.0);
    }
}

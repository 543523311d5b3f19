use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
};

use crate::idx::{HEIGHT, WIDTH};

/// Turns MNIST items into batches with pixel values scaled to `[0, 1]`.
#[derive(Clone, Default)]
pub struct MnistBatcher {}

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    /// Images with a channel axis, `[batch_size, 1, height, width]`.
    pub images: Tensor<B, 4>,
    /// Class labels, `[batch_size]`.
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let batch_size = items.len();

        let pixels = items
            .iter()
            .flat_map(|item| item.image.iter().flatten().copied())
            .collect::<Vec<f32>>();
        let labels = items
            .iter()
            .map(|item| item.label as i64)
            .collect::<Vec<i64>>();

        let images = TensorData::new(pixels, [batch_size, 1, HEIGHT, WIDTH]);
        let images = Tensor::<B, 4>::from_data(images.convert::<B::FloatElem>(), device) / 255;

        let targets = TensorData::new(labels, [batch_size]);
        let targets = Tensor::<B, 1, Int>::from_data(targets.convert::<B::IntElem>(), device);

        MnistBatch { images, targets }
    }
}

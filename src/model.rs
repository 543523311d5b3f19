use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Relu,
    },
    prelude::*,
    train::ClassificationOutput,
};

const KERNEL_SIZE: [usize; 2] = [3, 3];
const POOL_SIZE: [usize; 2] = [2, 2];

/// Fully convolutional digit classifier.
///
/// Two conv/max-pool stages shrink a 28x28 image to 5x5, then two more valid
/// convolutions bring it down to a single pixel with one channel per class,
/// so no dense layer is needed.
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    conv0: Conv2d<B>,
    pool0: MaxPool2d,
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    dropout: Dropout,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    activation: Relu,
}

#[derive(Config, Debug)]
pub struct ModelConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 32)]
    pub conv0_channels: usize,
    #[config(default = 64)]
    pub conv1_channels: usize,
    #[config(default = 128)]
    pub conv2_channels: usize,
    #[config(default = 0.25)]
    pub dropout: f64,
}

impl ModelConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let pool = MaxPool2dConfig::new(POOL_SIZE).with_strides(POOL_SIZE);

        Model {
            conv0: Conv2dConfig::new([1, self.conv0_channels], KERNEL_SIZE).init(device),
            pool0: pool.init(),
            conv1: Conv2dConfig::new([self.conv0_channels, self.conv1_channels], KERNEL_SIZE)
                .init(device),
            pool1: pool.init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            conv2: Conv2dConfig::new([self.conv1_channels, self.conv2_channels], KERNEL_SIZE)
                .init(device),
            conv3: Conv2dConfig::new([self.conv2_channels, self.num_classes], KERNEL_SIZE)
                .init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> Model<B> {
    /// # Shapes
    ///   - Images [batch_size, 1, 28, 28]
    ///   - Output [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.conv0.forward(images)); // [batch_size, 32, 26, 26]
        let x = self.pool0.forward(x); // [batch_size, 32, 13, 13]
        let x = self.activation.forward(self.conv1.forward(x)); // [batch_size, 64, 11, 11]
        let x = self.pool1.forward(x); // [batch_size, 64, 5, 5]
        let x = self.dropout.forward(x);
        let x = self.activation.forward(self.conv2.forward(x)); // [batch_size, 128, 3, 3]
        let x = self.conv3.forward(x); // [batch_size, num_classes, 1, 1]

        x.flatten(1, 3)
    }

    /// Forward pass with the sparse categorical cross-entropy of the logits.
    pub fn forward_classification(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput::new(loss, output, targets)
    }
}

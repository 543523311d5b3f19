#[macro_use]
extern crate derive_new;

pub mod artifact;
pub mod data;
pub mod dataset;
pub mod error;
pub mod history;
pub mod idx;
pub mod logging;
pub mod metric;
pub mod model;
pub mod plot;
pub mod training;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) type TestBackend = burn::backend::NdArray<f32>;

#[cfg(test)]
pub(crate) type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

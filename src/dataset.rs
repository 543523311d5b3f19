use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use burn::data::dataset::{
    transform::PartialDataset,
    vision::{MnistDataset, MnistItem},
    Dataset, InMemDataset,
};
use flate2::read::GzDecoder;

use crate::{
    error::{Error, Result},
    idx,
};

/// Shared handle on a loaded split.
pub type MnistSplit = Arc<dyn Dataset<MnistItem>>;

const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    fn files(&self) -> (&'static str, &'static str) {
        match self {
            Split::Train => (TRAIN_IMAGES, TRAIN_LABELS),
            Split::Test => (TEST_IMAGES, TEST_LABELS),
        }
    }
}

/// Where the MNIST splits come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MnistSource {
    /// Fetched from the CVDF mirror and cached by `burn-dataset`.
    Download,
    /// The four IDX files, optionally gzipped, in a local directory.
    Directory(PathBuf),
}

impl MnistSource {
    /// Load a split, keeping at most `limit` items when given.
    pub fn load(&self, split: Split, limit: Option<usize>) -> Result<MnistSplit> {
        let dataset: MnistSplit = match self {
            MnistSource::Download => match split {
                Split::Train => Arc::new(MnistDataset::train()),
                Split::Test => Arc::new(MnistDataset::test()),
            },
            MnistSource::Directory(dir) => Arc::new(load_directory(dir, split)?),
        };

        log::info!(
            "Loaded {} {} items from {:?}",
            dataset.len(),
            split.name(),
            self
        );

        Ok(truncate(dataset, limit))
    }
}

/// Keep the first `limit` items of a split.
pub fn truncate(dataset: MnistSplit, limit: Option<usize>) -> MnistSplit {
    match limit {
        Some(limit) if limit < dataset.len() => {
            log::info!("Keeping the first {limit} of {} items", dataset.len());
            Arc::new(PartialDataset::new(dataset, 0, limit))
        }
        _ => dataset,
    }
}

fn load_directory(dir: &Path, split: Split) -> Result<InMemDataset<MnistItem>> {
    let (images_file, labels_file) = split.files();

    let (path, bytes) = read_file(dir, images_file)?;
    let images = idx::parse_images(&bytes).map_err(|source| Error::Idx { path, source })?;

    let (path, bytes) = read_file(dir, labels_file)?;
    let labels = idx::parse_labels(&bytes).map_err(|source| Error::Idx { path, source })?;

    if images.len() != labels.len() {
        return Err(Error::CountMismatch {
            split: split.name(),
            images: images.len(),
            labels: labels.len(),
        });
    }

    let items = images
        .into_iter()
        .zip(labels)
        .map(|(image, label)| MnistItem { image, label })
        .collect();

    Ok(InMemDataset::new(items))
}

/// Read a dataset file, falling back to its gzipped variant.
fn read_file(dir: &Path, name: &str) -> Result<(PathBuf, Vec<u8>)> {
    let mut bytes = Vec::new();

    let plain = dir.join(name);
    if plain.exists() {
        File::open(&plain)?.read_to_end(&mut bytes)?;
        return Ok((plain, bytes));
    }

    let gzipped = dir.join(format!("{name}.gz"));
    if gzipped.exists() {
        GzDecoder::new(File::open(&gzipped)?).read_to_end(&mut bytes)?;
        return Ok((gzipped, bytes));
    }

    Err(Error::MissingFile(plain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idx::tests::{images_file, labels_file};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    #[test]
    fn load_directory_with_plain_and_gzipped_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join(TEST_IMAGES), images_file(3, |item, _| item as u8)).unwrap();

        let mut encoder = GzEncoder::new(
            File::create(dir.join(format!("{TEST_LABELS}.gz"))).unwrap(),
            Compression::default(),
        );
        encoder.write_all(&labels_file(&[7, 2, 1])).unwrap();
        encoder.finish().unwrap();

        let dataset = MnistSource::Directory(dir.to_path_buf())
            .load(Split::Test, None)
            .unwrap();

        assert_eq!(dataset.len(), 3);
        let item = dataset.get(2).unwrap();
        assert_eq!(item.label, 1);
        assert_eq!(item.image[27][27], 2.0);
    }

    #[test]
    fn load_directory_applies_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join(TRAIN_IMAGES), images_file(5, |_, _| 0)).unwrap();
        std::fs::write(dir.join(TRAIN_LABELS), labels_file(&[0, 1, 2, 3, 4])).unwrap();

        let dataset = MnistSource::Directory(dir.to_path_buf())
            .load(Split::Train, Some(2))
            .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(1).unwrap().label, 1);
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn load_directory_rejects_count_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join(TRAIN_IMAGES), images_file(2, |_, _| 0)).unwrap();
        std::fs::write(dir.join(TRAIN_LABELS), labels_file(&[4])).unwrap();

        let result = MnistSource::Directory(dir.to_path_buf()).load(Split::Train, None);

        assert!(matches!(
            result,
            Err(Error::CountMismatch {
                split: "train",
                images: 2,
                labels: 1
            })
        ));
    }

    #[test]
    fn load_directory_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let result = MnistSource::Directory(dir.to_path_buf()).load(Split::Test, None);

        assert!(matches!(result, Err(Error::MissingFile(path)) if path.ends_with(TEST_IMAGES)));
    }

    #[test]
    fn load_directory_reports_corrupt_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join(TEST_IMAGES), [0u8, 0, 8, 3, 0]).unwrap();

        let result = MnistSource::Directory(dir.to_path_buf()).load(Split::Test, None);

        assert!(matches!(result, Err(Error::Idx { .. })));
    }
}

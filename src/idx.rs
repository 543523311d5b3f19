//! Decoding of the IDX files MNIST is distributed in.
//!
//! Both formats start with a big-endian header: a magic number, the item
//! count and, for images, the number of rows and columns. The payload follows
//! as raw unsigned bytes.

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const NUM_CLASSES: usize = 10;

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;
const IMAGES_HEADER_LEN: usize = 16;
const LABELS_HEADER_LEN: usize = 8;

/// A single decoded image, with raw pixel intensities in `0..=255`.
pub type Image = [[f32; WIDTH]; HEIGHT];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IdxError {
    #[error("header is {found} bytes, expected at least {expected}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("bad magic number {found:#010x}, expected {expected:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("images are {rows}x{cols}, expected 28x28")]
    BadDimensions { rows: usize, cols: usize },

    #[error("payload is {found} bytes, expected {expected}")]
    BadPayload { expected: usize, found: usize },

    #[error("label {label} at index {index} is not a digit")]
    BadLabel { index: usize, label: u8 },
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(buf)
}

fn check_header(bytes: &[u8], len: usize, magic: u32) -> Result<usize, IdxError> {
    if bytes.len() < len {
        return Err(IdxError::TruncatedHeader {
            expected: len,
            found: bytes.len(),
        });
    }

    let found = read_u32(bytes, 0);
    if found != magic {
        return Err(IdxError::BadMagic {
            expected: magic,
            found,
        });
    }

    Ok(read_u32(bytes, 4) as usize)
}

/// Decode an IDX3 image file into 28x28 images.
pub fn parse_images(bytes: &[u8]) -> Result<Vec<Image>, IdxError> {
    let count = check_header(bytes, IMAGES_HEADER_LEN, IMAGES_MAGIC)?;
    let rows = read_u32(bytes, 8) as usize;
    let cols = read_u32(bytes, 12) as usize;

    if rows != HEIGHT || cols != WIDTH {
        return Err(IdxError::BadDimensions { rows, cols });
    }

    let payload = &bytes[IMAGES_HEADER_LEN..];
    let expected = count * WIDTH * HEIGHT;
    if payload.len() != expected {
        return Err(IdxError::BadPayload {
            expected,
            found: payload.len(),
        });
    }

    let images = payload
        .chunks_exact(WIDTH * HEIGHT)
        .map(|chunk| {
            let mut image = [[0f32; WIDTH]; HEIGHT];
            for (i, pixel) in chunk.iter().enumerate() {
                image[i / WIDTH][i % WIDTH] = *pixel as f32;
            }
            image
        })
        .collect();

    Ok(images)
}

/// Decode an IDX1 label file.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>, IdxError> {
    let count = check_header(bytes, LABELS_HEADER_LEN, LABELS_MAGIC)?;

    let payload = &bytes[LABELS_HEADER_LEN..];
    if payload.len() != count {
        return Err(IdxError::BadPayload {
            expected: count,
            found: payload.len(),
        });
    }

    if let Some((index, label)) = payload
        .iter()
        .enumerate()
        .find(|(_, label)| **label as usize >= NUM_CLASSES)
    {
        return Err(IdxError::BadLabel {
            index,
            label: *label,
        });
    }

    Ok(payload.to_vec())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn images_file(count: usize, fill: impl Fn(usize, usize) -> u8) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&(count as u32).to_be_bytes());
        bytes.extend_from_slice(&(HEIGHT as u32).to_be_bytes());
        bytes.extend_from_slice(&(WIDTH as u32).to_be_bytes());
        for item in 0..count {
            for pixel in 0..WIDTH * HEIGHT {
                bytes.push(fill(item, pixel));
            }
        }
        bytes
    }

    pub(crate) fn labels_file(labels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn parse_images_row_major() {
        let bytes = images_file(2, |item, pixel| if pixel == 29 { 200 + item as u8 } else { 0 });

        let images = parse_images(&bytes).unwrap();

        assert_eq!(images.len(), 2);
        // Pixel 29 is row 1, column 1.
        assert_eq!(images[0][1][1], 200.0);
        assert_eq!(images[1][1][1], 201.0);
        assert_eq!(images[1][0][1], 0.0);
    }

    #[test]
    fn parse_images_rejects_bad_magic() {
        let mut bytes = images_file(1, |_, _| 0);
        bytes[3] = 0x01;

        assert_eq!(
            parse_images(&bytes),
            Err(IdxError::BadMagic {
                expected: IMAGES_MAGIC,
                found: LABELS_MAGIC,
            })
        );
    }

    #[test]
    fn parse_images_rejects_other_dimensions() {
        let mut bytes = images_file(1, |_, _| 0);
        bytes[11] = 32;

        assert_eq!(
            parse_images(&bytes),
            Err(IdxError::BadDimensions { rows: 32, cols: 28 })
        );
    }

    #[test]
    fn parse_images_rejects_truncated_payload() {
        let mut bytes = images_file(3, |_, _| 7);
        bytes.truncate(bytes.len() - 10);

        assert_eq!(
            parse_images(&bytes),
            Err(IdxError::BadPayload {
                expected: 3 * 784,
                found: 3 * 784 - 10,
            })
        );
    }

    #[test]
    fn parse_images_rejects_short_header() {
        assert_eq!(
            parse_images(&[0, 0, 8]),
            Err(IdxError::TruncatedHeader {
                expected: 16,
                found: 3
            })
        );
    }

    #[test]
    fn parse_labels_reads_digits() {
        let bytes = labels_file(&[5, 0, 4, 1, 9]);

        assert_eq!(parse_labels(&bytes).unwrap(), vec![5, 0, 4, 1, 9]);
    }

    #[test]
    fn parse_labels_rejects_non_digit() {
        let bytes = labels_file(&[3, 12]);

        assert_eq!(
            parse_labels(&bytes),
            Err(IdxError::BadLabel {
                index: 1,
                label: 12
            })
        );
    }

    #[test]
    fn parse_labels_rejects_count_mismatch() {
        let mut bytes = labels_file(&[1, 2, 3]);
        bytes.pop();

        assert_eq!(
            parse_labels(&bytes),
            Err(IdxError::BadPayload {
                expected: 3,
                found: 2
            })
        );
    }
}

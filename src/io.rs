//! Pointset and query loaders.
//!
//! Three container formats produce the flat row-major `N x D` buffer the
//! index borrows: whitespace-separated ASCII scalars, the IDX image format
//! (big-endian header, unsigned-byte pixels), and fvecs records (per-record
//! little-endian dimension prefix followed by `D` IEEE-754 floats).
//!
//! Loader failures never reach the index; they surface here as
//! [`LoadError`] values.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while loading a pointset file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A scalar failed to parse.
    #[error("bad scalar at position {index}: {message}")]
    Parse { index: usize, message: String },

    /// File ended before the expected number of scalars.
    #[error("expected {expected} scalars, file holds {actual}")]
    Truncated { expected: usize, actual: usize },

    /// A structured header disagrees with the expected geometry.
    #[error("header mismatch: {0}")]
    Header(String),
}

/// Read `count * dim` whitespace-separated scalars into a flat buffer.
///
/// Line structure is irrelevant; any whitespace separates scalars. Extra
/// trailing content beyond `count * dim` scalars is ignored.
pub fn read_ascii<T, P>(path: P, count: usize, dim: usize) -> Result<Vec<T>, LoadError>
where
    T: FromStr,
    T::Err: Display,
    P: AsRef<Path>,
{
    let expected = count * dim;
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::with_capacity(expected);

    'lines: for line in reader.lines() {
        for token in line?.split_whitespace() {
            if out.len() == expected {
                break 'lines;
            }
            let value = token.parse::<T>().map_err(|e| LoadError::Parse {
                index: out.len(),
                message: e.to_string(),
            })?;
            out.push(value);
        }
    }

    if out.len() < expected {
        return Err(LoadError::Truncated {
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}

/// Contents of an IDX-format image file.
#[derive(Debug, Clone)]
pub struct IdxData {
    /// Number of images (points).
    pub count: usize,
    /// Image rows; `rows * cols` is the point dimension.
    pub rows: usize,
    /// Image columns.
    pub cols: usize,
    /// Flat row-major pixel buffer of `count * rows * cols` bytes.
    pub pixels: Vec<u8>,
}

/// Read an IDX image file: four big-endian `u32` header words (magic,
/// count, rows, cols) followed by `count * rows * cols` unsigned bytes.
pub fn read_idx<P: AsRef<Path>>(path: P) -> Result<IdxData, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut word = [0u8; 4];
    let mut header = [0u32; 4];
    for slot in header.iter_mut() {
        reader.read_exact(&mut word)?;
        *slot = u32::from_be_bytes(word);
    }
    let [_magic, count, rows, cols] = header;
    let (count, rows, cols) = (count as usize, rows as usize, cols as usize);

    let expected = count * rows * cols;
    let mut pixels = Vec::with_capacity(expected);
    reader.read_to_end(&mut pixels)?;
    if pixels.len() < expected {
        return Err(LoadError::Truncated {
            expected,
            actual: pixels.len(),
        });
    }
    pixels.truncate(expected);

    Ok(IdxData {
        count,
        rows,
        cols,
        pixels,
    })
}

/// Read `count` fvecs records of dimension `dim` into a flat buffer.
///
/// Each record is a little-endian `u32` dimension prefix followed by that
/// many little-endian `f32` components; every prefix must equal `dim`.
pub fn read_fvecs<P: AsRef<Path>>(path: P, count: usize, dim: usize) -> Result<Vec<f32>, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut out = Vec::with_capacity(count * dim);
    let mut word = [0u8; 4];

    for record in 0..count {
        if let Err(e) = reader.read_exact(&mut word) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Err(LoadError::Truncated {
                    expected: count * dim,
                    actual: out.len(),
                });
            }
            return Err(LoadError::Io(e));
        }
        let found = u32::from_le_bytes(word) as usize;
        if found != dim {
            return Err(LoadError::Header(format!(
                "record {record} declares dimension {found}, expected {dim}"
            )));
        }
        for _ in 0..dim {
            reader.read_exact(&mut word).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    LoadError::Truncated {
                        expected: count * dim,
                        actual: out.len(),
                    }
                } else {
                    LoadError::Io(e)
                }
            })?;
            out.push(f32::from_le_bytes(word));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ascii_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.txt");
        std::fs::write(&path, "1 2.5 -3\n4 5 6.25\n").unwrap();

        let v: Vec<f32> = read_ascii(&path, 2, 3).unwrap();
        assert_eq!(v, vec![1.0, 2.5, -3.0, 4.0, 5.0, 6.25]);
    }

    #[test]
    fn ascii_integer_scalars_and_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ints.txt");
        std::fs::write(&path, "7 8 9").unwrap();

        let v: Vec<i32> = read_ascii(&path, 1, 3).unwrap();
        assert_eq!(v, vec![7, 8, 9]);

        assert!(matches!(
            read_ascii::<i32, _>(&path, 2, 3),
            Err(LoadError::Truncated {
                expected: 6,
                actual: 3
            })
        ));
    }

    #[test]
    fn ascii_parse_failure_names_the_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "1 2 oops 4").unwrap();

        match read_ascii::<f32, _>(&path, 2, 2) {
            Err(LoadError::Parse { index: 2, .. }) => {}
            other => panic!("expected parse error at 2, got {other:?}"),
        }
    }

    #[test]
    fn idx_header_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.idx");
        let mut f = File::create(&path).unwrap();
        for word in [2051u32, 2, 2, 3] {
            f.write_all(&word.to_be_bytes()).unwrap();
        }
        f.write_all(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]).unwrap();
        drop(f);

        let idx = read_idx(&path).unwrap();
        assert_eq!((idx.count, idx.rows, idx.cols), (2, 2, 3));
        assert_eq!(idx.pixels.len(), 12);
        assert_eq!(idx.pixels[7], 7);
    }

    #[test]
    fn fvecs_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.fvecs");
        let mut f = File::create(&path).unwrap();
        for row in [[1.0f32, 2.0], [3.0, 4.0]] {
            f.write_all(&2u32.to_le_bytes()).unwrap();
            for x in row {
                f.write_all(&x.to_le_bytes()).unwrap();
            }
        }
        drop(f);

        let v = read_fvecs(&path, 2, 2).unwrap();
        assert_eq!(v, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn fvecs_dimension_mismatch_is_a_header_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fvecs");
        let mut f = File::create(&path).unwrap();
        f.write_all(&3u32.to_le_bytes()).unwrap();
        for x in [1.0f32, 2.0, 3.0] {
            f.write_all(&x.to_le_bytes()).unwrap();
        }
        drop(f);

        assert!(matches!(
            read_fvecs(&path, 1, 2),
            Err(LoadError::Header(_))
        ));
    }
}

//! Norm-augmented vector store.
//!
//! Vectors live in one contiguous row-major buffer (`n * dim` floats), with a
//! parallel array of [`NormBounds`] computed once at load time. Both are
//! immutable afterwards; the pruning kernels read nothing else.
//!
//! Two on-disk encodings are supported:
//!
//! | Encoding | Layout |
//! |----------|--------|
//! | Text | one record per line: an ignored id token, then `d` floats |
//! | Binary | `d` consecutive little-endian `f32` per record, no header |
//!
//! Both produce identical vectors and bounds for the same logical data.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};
use crate::kernel::{NormBounds, BLOCK, NORM_K};

/// On-disk encoding of a vector collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Whitespace-separated text, one record per line.
    #[default]
    Text,
    /// Raw little-endian `f32` records.
    Binary,
}

/// Compute the suffix-norm bounds of one vector.
///
/// Level 0 is the full L2 norm. Level `t >= 1` is the norm of dimensions
/// `8t..d`, i.e. `sqrt(S - A[t])` where `S` is the total sum of squares and
/// `A[t]` the sum of squares of the first `8t` dimensions. Values are
/// non-increasing in `t`; levels with `8t >= d` are 0.
///
/// Each level sums its own suffix in `f64` and narrows after the square root.
/// Subtracting prefixes in `f32` loses a small tail behind large leading
/// coordinates and would report a zero bound for a nonzero suffix.
#[must_use]
pub fn suffix_norms(v: &[f32]) -> NormBounds {
    let mut sums = [0.0_f64; NORM_K];
    // Walk backwards so each level's sum is the next level's sum plus its block.
    let mut acc = 0.0_f64;
    for t in (0..NORM_K).rev() {
        let start = (BLOCK * t).min(v.len());
        let end = if t + 1 < NORM_K {
            (BLOCK * (t + 1)).min(v.len())
        } else {
            v.len()
        };
        acc = v[start..end]
            .iter()
            .rev()
            .fold(acc, |s, &x| s + f64::from(x) * f64::from(x));
        sums[t] = acc;
    }

    let mut norms = [0.0_f32; NORM_K];
    for (norm, s) in norms.iter_mut().zip(sums) {
        *norm = s.sqrt() as f32;
    }
    norms
}

/// A collection of equal-length vectors with their suffix-norm bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStore {
    dim: usize,
    data: Vec<f32>,
    norms: Vec<NormBounds>,
}

/// A loaded collection plus how long loading took.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub store: VectorStore,
    pub elapsed: Duration,
}

impl VectorStore {
    /// Build a store from a flat row-major buffer.
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidParameter("dimension must be > 0".into()));
        }
        if data.len() % dim != 0 {
            return Err(Error::InvalidParameter(format!(
                "buffer of {} floats is not a multiple of dimension {dim}",
                data.len()
            )));
        }
        let norms = data.chunks_exact(dim).map(suffix_norms).collect();
        Ok(Self { dim, data, norms })
    }

    /// Build a store from individual vectors, all of length `dim`.
    pub fn from_vectors<V: AsRef<[f32]>>(dim: usize, vectors: &[V]) -> Result<Self> {
        let mut data = Vec::with_capacity(vectors.len() * dim);
        for v in vectors {
            let v = v.as_ref();
            if v.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
            data.extend_from_slice(v);
        }
        Self::from_flat(dim, data)
    }

    /// Load `n` records of dimension `d` from `path`.
    pub fn load(path: impl AsRef<Path>, n: usize, d: usize, encoding: Encoding) -> Result<LoadReport> {
        let path = path.as_ref();
        let start = Instant::now();
        let reader = BufReader::new(File::open(path)?);
        let store = match encoding {
            Encoding::Text => Self::read_text(reader, n, d)?,
            Encoding::Binary => Self::read_binary(reader, n, d)?,
        };
        let elapsed = start.elapsed();
        debug!(
            path = %path.display(),
            n,
            d,
            ?encoding,
            elapsed_ms = elapsed.as_millis() as u64,
            "loaded vectors"
        );
        Ok(LoadReport { store, elapsed })
    }

    /// Parse `n` text records. Blank lines are skipped, records past `n` ignored.
    pub fn read_text<R: BufRead>(reader: R, n: usize, d: usize) -> Result<Self> {
        let mut data = Vec::with_capacity(prealloc(n, d)?);
        let mut records = 0;

        for (lineno, line) in reader.lines().enumerate() {
            if records == n {
                break;
            }
            let line = line?;
            let mut tokens = line.split_whitespace();
            if tokens.next().is_none() {
                continue;
            }
            let mut values = 0;
            for tok in tokens.by_ref().take(d) {
                let x: f32 = tok.parse().map_err(|_| {
                    Error::format(format!("line {}: cannot parse {tok:?} as a float", lineno + 1))
                })?;
                data.push(x);
                values += 1;
            }
            if values < d {
                return Err(Error::format(format!(
                    "line {}: expected {d} values, found {values}",
                    lineno + 1
                )));
            }
            if tokens.next().is_some() {
                return Err(Error::format(format!(
                    "line {}: more than {d} values",
                    lineno + 1
                )));
            }
            records += 1;
        }

        if records < n {
            return Err(Error::format(format!("expected {n} records, found {records}")));
        }
        Self::from_flat(d, data)
    }

    /// Read `n` binary records of `d` little-endian floats each.
    pub fn read_binary<R: Read>(mut reader: R, n: usize, d: usize) -> Result<Self> {
        let mut data = Vec::with_capacity(prealloc(n, d)?);
        let mut buf = [0u8; 4];

        for i in 0..n {
            for _ in 0..d {
                match reader.read_exact(&mut buf) {
                    Ok(()) => data.push(f32::from_le_bytes(buf)),
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        return Err(Error::format(format!("expected {n} records, found {i}")));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Self::from_flat(d, data)
    }

    /// Number of vectors.
    #[inline]
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Vector dimensionality.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Vector `id`. Panics if out of range.
    #[inline]
    pub fn vector(&self, id: usize) -> &[f32] {
        &self.data[id * self.dim..(id + 1) * self.dim]
    }

    /// Suffix-norm bounds of vector `id`.
    #[inline]
    pub fn norms(&self, id: usize) -> &NormBounds {
        &self.norms[id]
    }

    /// Full L2 norm of vector `id`.
    #[inline]
    pub fn norm(&self, id: usize) -> f32 {
        self.norms[id][0]
    }

    /// Iterate `(vector, bounds)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f32], &NormBounds)> + '_ {
        self.data.chunks_exact(self.dim).zip(self.norms.iter())
    }

    /// Ids sorted by descending full norm, ties by ascending id.
    pub fn ids_by_norm_desc(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = (0..self.len() as u32).collect();
        // Stable sort over ascending ids keeps equal norms in id order.
        ids.sort_by(|&a, &b| self.norm(b as usize).total_cmp(&self.norm(a as usize)));
        ids
    }

    /// Histogram of full norms over `buckets` equal-width buckets in `[0, max_norm]`.
    pub fn norm_distribution(&self, buckets: usize) -> NormHistogram {
        let buckets = buckets.max(1);
        let max_norm = self.norms.iter().map(|b| b[0]).fold(0.0_f32, f32::max);
        let width = max_norm / buckets as f32;

        let mut counts = vec![0usize; buckets];
        for b in &self.norms {
            let slot = if width > 0.0 {
                ((b[0] / width).ceil() as i64 - 1).clamp(0, buckets as i64 - 1) as usize
            } else {
                0
            };
            counts[slot] += 1;
        }

        NormHistogram {
            max_norm,
            counts,
            total: self.len(),
        }
    }
}

/// Upper bound on floats reserved before any record has been read.
const MAX_PREALLOC: usize = 1 << 20;

/// Validate `n x d` and size the initial buffer. Counts come from the caller,
/// not the file, so the reservation is capped and the buffer grows as needed.
fn prealloc(n: usize, d: usize) -> Result<usize> {
    if d == 0 {
        return Err(Error::InvalidParameter("dimension must be > 0".into()));
    }
    let total = n
        .checked_mul(d)
        .ok_or_else(|| Error::InvalidParameter(format!("{n} x {d} floats overflows")))?;
    Ok(total.min(MAX_PREALLOC))
}

/// Distribution of full norms, bucketed relative to the largest norm.
#[derive(Debug, Clone, PartialEq)]
pub struct NormHistogram {
    pub max_norm: f32,
    pub counts: Vec<usize>,
    pub total: usize,
}

/// Buckets used by the norm distribution report.
pub const NORM_BUCKETS: usize = 25;

impl NormHistogram {
    /// Bucket width.
    pub fn interval(&self) -> f32 {
        self.max_norm / self.counts.len() as f32
    }

    /// `(bucket midpoint as % of max norm, % of vectors in bucket)` rows.
    pub fn rows(&self) -> Vec<(f32, f32)> {
        let m = self.counts.len() as f32;
        let (half, step) = (0.5 / m, 1.0 / m);
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let share = if self.total == 0 {
                    0.0
                } else {
                    c as f32 * 100.0 / self.total as f32
                };
                ((half + step * i as f32) * 100.0, share)
            })
            .collect()
    }

    /// Write one `"<midpoint>\t<percent>"` line per bucket.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        for (mid, share) in self.rows() {
            writeln!(w, "{mid:.1}\t{share:.6}")?;
        }
        writeln!(w)?;
        w.flush()?;
        Ok(())
    }

    /// Write the report to `path`. The parent directory must exist.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn suffix_norms_levels() {
        let v: Vec<f32> = (0..20).map(|i| i as f32).collect();
        let b = suffix_norms(&v);
        let tail = |from: usize| v[from..].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((b[0] - tail(0)).abs() < 1e-3);
        assert!((b[1] - tail(8)).abs() < 1e-3);
        assert!((b[2] - tail(16)).abs() < 1e-3);
        assert_eq!(b[3], 0.0);
    }

    #[test]
    fn suffix_norms_short_vector() {
        let b = suffix_norms(&[3.0, 4.0]);
        assert_eq!(b, [5.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn small_tail_survives_large_head() {
        let mut v = vec![0.0_f32; 16];
        v[0] = 1e4;
        for x in &mut v[8..] {
            *x = 1e-2;
        }
        let b = suffix_norms(&v);
        let tail = (8.0_f32 * 1e-4).sqrt();
        assert!((b[1] - tail).abs() < 1e-6, "tail bound {} vs {}", b[1], tail);
        assert_eq!(b[0], 1e4);
        assert_eq!(b[2], 0.0);
    }

    #[test]
    fn text_and_binary_agree() {
        let text = "0 1.5 -2 0.25\n1 0 0 3\n";
        let mut bin = Vec::new();
        for x in [1.5_f32, -2.0, 0.25, 0.0, 0.0, 3.0] {
            bin.extend_from_slice(&x.to_le_bytes());
        }
        let a = VectorStore::read_text(Cursor::new(text), 2, 3).unwrap();
        let b = VectorStore::read_binary(Cursor::new(bin), 2, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.vector(1), &[0.0, 0.0, 3.0]);
        assert_eq!(a.norm(1), 3.0);
    }

    #[test]
    fn short_inputs_are_format_errors() {
        let err = VectorStore::read_text(Cursor::new("0 1 2\n"), 2, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let err = VectorStore::read_text(Cursor::new("0 1\n"), 1, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let err = VectorStore::read_binary(Cursor::new(vec![0u8; 12]), 2, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn extra_values_are_format_errors() {
        let err = VectorStore::read_text(Cursor::new("0 1 2 3\n"), 1, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn oversized_shapes_do_not_allocate_up_front() {
        let err = VectorStore::read_binary(Cursor::new(vec![0u8; 8]), usize::MAX, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));

        let err = VectorStore::read_text(Cursor::new("0 1\n"), usize::MAX / 2, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let err = VectorStore::read_binary(Cursor::new(vec![0u8; 8]), 1, 1 << 40).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn bad_float_is_format_error() {
        let err = VectorStore::read_text(Cursor::new("0 1 abc\n"), 1, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn blank_lines_and_extra_records() {
        let text = "\n0 1 0\n\n1 0 1\n2 5 5\n";
        let s = VectorStore::read_text(Cursor::new(text), 2, 2).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.vector(1), &[0.0, 1.0]);
    }

    #[test]
    fn norm_order_breaks_ties_by_id() {
        let s = VectorStore::from_vectors(2, &[[1.0_f32, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.5]]).unwrap();
        assert_eq!(s.ids_by_norm_desc(), vec![2, 0, 1, 3]);
    }

    #[test]
    fn from_vectors_rejects_ragged_input() {
        let err = VectorStore::from_vectors(2, &[vec![1.0_f32, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn norm_distribution_buckets() {
        let s = VectorStore::from_vectors(1, &[[1.0_f32], [2.0], [4.0], [0.0]]).unwrap();
        let h = s.norm_distribution(4);
        assert_eq!(h.max_norm, 4.0);
        assert_eq!(h.counts, vec![2, 1, 0, 1]);
        let rows = h.rows();
        assert_eq!(rows[0], (12.5, 50.0));

        let mut out = Vec::new();
        h.write_to(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("12.5\t50.000000\n37.5\t25.000000\n"));
    }

    #[test]
    fn norm_distribution_all_zero() {
        let s = VectorStore::from_vectors(2, &[[0.0_f32, 0.0], [0.0, 0.0]]).unwrap();
        let h = s.norm_distribution(NORM_BUCKETS);
        assert_eq!(h.counts[0], 2);
    }
}

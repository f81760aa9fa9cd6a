//! Exact MIP ground truth and its on-disk format.
//!
//! A ground truth holds, for every query, the top `depth` results (usually
//! [`MAXK`]); any shallower top-k truth is a prefix of it.
//!
//! File layout (text):
//!
//! ```text
//! <qn> <depth>
//! <id> <score> <id> <score> ... (depth pairs, descending score)
//! ...                           (qn lines)
//! ```
//!
//! Ids are written 1-based and converted back to 0-based on read. Scores use
//! shortest round-trip formatting, so a written file reads back bit-exact.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use crate::error::{Error, Result};
use crate::search::{MipSearch, ScanStats};
use crate::store::VectorStore;
use crate::topk::Neighbor;

/// Depth of a ground truth file.
pub const MAXK: usize = 100;

/// Exact top-`depth` results for a query set.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruth {
    depth: usize,
    results: Vec<Vec<Neighbor>>,
}

/// A computed ground truth with timing and scan counters.
#[derive(Debug, Clone)]
pub struct GroundTruthReport {
    pub truth: GroundTruth,
    pub elapsed: Duration,
    pub stats: ScanStats,
}

impl GroundTruth {
    /// Wrap per-query results; every row must hold exactly `depth` entries.
    pub fn from_results(depth: usize, results: Vec<Vec<Neighbor>>) -> Result<Self> {
        if depth == 0 {
            return Err(Error::InvalidParameter("depth must be > 0".into()));
        }
        if let Some((i, row)) = results.iter().enumerate().find(|(_, r)| r.len() != depth) {
            return Err(Error::InvalidParameter(format!(
                "query {i} has {} results, expected {depth}",
                row.len()
            )));
        }
        Ok(Self { depth, results })
    }

    /// Run the exact search at `depth` for every query.
    pub fn compute(data: &VectorStore, queries: &VectorStore, depth: usize) -> Result<GroundTruthReport> {
        if data.len() < depth {
            return Err(Error::InvalidParameter(format!(
                "ground truth depth {depth} exceeds data size {}",
                data.len()
            )));
        }
        let report = MipSearch::new(data).search_all(queries, depth)?;
        let truth = Self::from_results(depth, report.results)?;
        info!(
            queries = queries.len(),
            depth,
            evaluated = report.stats.evaluated,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "computed ground truth"
        );
        Ok(GroundTruthReport {
            truth,
            elapsed: report.elapsed,
            stats: report.stats,
        })
    }

    /// Results per query.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of queries.
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Full result row for query `i`.
    pub fn get(&self, i: usize) -> Option<&[Neighbor]> {
        self.results.get(i).map(Vec::as_slice)
    }

    /// Top `k` of query `i` (clamped to the depth).
    pub fn top_k(&self, i: usize, k: usize) -> Option<&[Neighbor]> {
        self.get(i).map(|row| &row[..k.min(row.len())])
    }

    /// All rows.
    pub fn results(&self) -> &[Vec<Neighbor>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Vec<Neighbor>> {
        self.results
    }

    /// Serialize in the text layout described in the module docs.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        writeln!(w, "{} {}", self.results.len(), self.depth)?;
        for row in &self.results {
            for n in row {
                write!(w, "{} {} ", u64::from(n.id) + 1, n.score)?;
            }
            writeln!(w)?;
        }
        w.flush()?;
        Ok(())
    }

    /// Write to `path` via a sibling temp file, so a failed write never leaves
    /// a truncated ground truth behind. The parent directory must exist.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = tmp_path(path);
        let written = File::create(&tmp)
            .map_err(Error::from)
            .and_then(|f| self.write_to(BufWriter::new(f)));
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, path).map_err(Error::from)) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    /// Parse a ground truth of any shape.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        let mut tokens = text.split_whitespace();

        let qn = parse_header(tokens.next(), "query count")?;
        let depth = parse_header(tokens.next(), "depth")?;
        if depth == 0 {
            return Err(Error::format("ground truth depth must be > 0"));
        }

        // The header is untrusted: reserve no more rows than the body can hold.
        let pairs = tokens.clone().count() / 2;
        let mut results = Vec::with_capacity(qn.min(pairs / depth));
        for q in 0..qn {
            let mut row = Vec::with_capacity(depth.min(pairs));
            for j in 0..depth {
                let (Some(id), Some(score)) = (tokens.next(), tokens.next()) else {
                    return Err(Error::format(format!(
                        "query {q}: expected {depth} results, found {j}"
                    )));
                };
                let id: u64 = id
                    .parse()
                    .map_err(|_| Error::format(format!("query {q}: bad id {id:?}")))?;
                if id == 0 || id > u64::from(u32::MAX) + 1 {
                    return Err(Error::format(format!("query {q}: id {id} out of range")));
                }
                let score: f32 = score
                    .parse()
                    .map_err(|_| Error::format(format!("query {q}: bad score {score:?}")))?;
                row.push(Neighbor {
                    id: (id - 1) as u32,
                    score,
                });
            }
            results.push(row);
        }
        Ok(Self { depth, results })
    }

    /// Parse a ground truth and require its header to be `<qn> <depth>`.
    pub fn read_expected<R: Read>(r: R, qn: usize, depth: usize) -> Result<Self> {
        let truth = Self::read_from(r)?;
        if truth.len() != qn || truth.depth() != depth {
            return Err(Error::format(format!(
                "ground truth header is \"{} {}\", expected \"{qn} {depth}\"",
                truth.len(),
                truth.depth()
            )));
        }
        Ok(truth)
    }

    /// Read a ground truth file of `qn` queries at `depth`.
    pub fn read(path: impl AsRef<Path>, qn: usize, depth: usize) -> Result<Self> {
        let start = Instant::now();
        let truth = Self::read_expected(File::open(path.as_ref())?, qn, depth)?;
        info!(
            path = %path.as_ref().display(),
            queries = qn,
            depth,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "read ground truth"
        );
        Ok(truth)
    }
}

fn parse_header(tok: Option<&str>, what: &str) -> Result<usize> {
    let tok = tok.ok_or_else(|| Error::format(format!("ground truth header: missing {what}")))?;
    tok.parse()
        .map_err(|_| Error::format(format!("ground truth header: bad {what} {tok:?}")))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Compute the depth-[`MAXK`] ground truth and persist it to `path`.
pub fn ground_truth(data: &VectorStore, queries: &VectorStore, path: impl AsRef<Path>) -> Result<GroundTruthReport> {
    let start = Instant::now();
    let mut report = GroundTruth::compute(data, queries, MAXK)?;
    report.truth.write(path)?;
    report.elapsed = start.elapsed();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> GroundTruth {
        GroundTruth::from_results(
            2,
            vec![
                vec![Neighbor { id: 2, score: 2.0 }, Neighbor { id: 0, score: 1.0 }],
                vec![Neighbor { id: 1, score: 0.1 }, Neighbor { id: 5, score: -3.25 }],
            ],
        )
        .unwrap()
    }

    #[test]
    fn write_format_uses_one_based_ids() {
        let mut out = Vec::new();
        sample().write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "2 2\n3 2 1 1 \n2 0.1 6 -3.25 \n");
    }

    #[test]
    fn huge_header_is_format_error() {
        let err = GroundTruth::read_from("99999999999999999 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let err = GroundTruth::read_from("1 99999999999999999\n1 0.5 \n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        // Renaming a file onto a non-empty directory fails.
        let target = dir.path().join("truth.mip");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        assert!(sample().write(&target).is_err());
        assert!(!dir.path().join("truth.mip.tmp").exists());
    }

    #[test]
    fn read_back_is_identical() {
        let mut out = Vec::new();
        let truth = sample();
        truth.write_to(&mut out).unwrap();
        let back = GroundTruth::read_expected(Cursor::new(out), 2, 2).unwrap();
        assert_eq!(back, truth);
    }

    #[test]
    fn header_mismatch_is_format_error() {
        let mut out = Vec::new();
        sample().write_to(&mut out).unwrap();
        let err = GroundTruth::read_expected(Cursor::new(out), 2, MAXK).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn truncated_rows_are_format_errors() {
        let err = GroundTruth::read_from(Cursor::new("1 2\n1 0.5 \n")).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        let err = GroundTruth::read_from(Cursor::new("1 1\n0 0.5 \n")).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn ragged_results_rejected() {
        let err = GroundTruth::from_results(2, vec![vec![Neighbor { id: 0, score: 1.0 }]]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn compute_requires_enough_data() {
        let data = VectorStore::from_vectors(2, &[[1.0_f32, 0.0]]).unwrap();
        let err = GroundTruth::compute(&data, &data, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn top_k_is_prefix() {
        let truth = sample();
        assert_eq!(truth.top_k(1, 1).unwrap(), &[Neighbor { id: 1, score: 0.1 }]);
        assert_eq!(truth.top_k(0, 10).unwrap().len(), 2);
        assert!(truth.top_k(2, 1).is_none());
    }
}

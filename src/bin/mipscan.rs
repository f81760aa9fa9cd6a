//! mipscan command line: ground truth generation and recall evaluation.
//!
//! ```bash
//! # Exact top-100 ground truth
//! mipscan truth --data data.bin --query query.bin -n 1000000 --qn 1000 -d 128 \
//!     --encoding binary --out results/truth.mip
//!
//! # Recall of an approximate result file against it
//! mipscan eval --truth results/truth.mip --candidates results/alsh.mip --qn 1000 --json
//!
//! # Norm distribution of a data set
//! mipscan norms --data data.bin -n 1000000 -d 128 --encoding binary --out results/norm_distribution.out
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mipscan::benchmark::{GroundTruth, RecallSummary, MAXK, RECALL_KS};
use mipscan::{Encoding, VectorStore, NORM_BUCKETS};

#[derive(Parser, Debug)]
#[command(name = "mipscan")]
#[command(about = "Exact maximum inner product search: ground truth and recall evaluation")]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute exact top-k results for every query and write them
    Truth {
        #[command(flatten)]
        data: DataArgs,

        /// Query set
        #[arg(long)]
        query: PathBuf,

        /// Number of queries
        #[arg(long)]
        qn: usize,

        /// Results per query
        #[arg(long, default_value_t = MAXK)]
        depth: usize,

        /// Output file
        #[arg(long)]
        out: PathBuf,
    },

    /// Score a candidate result file against a ground truth file
    Eval {
        /// Ground truth file
        #[arg(long)]
        truth: PathBuf,

        /// Candidate results, same layout as the ground truth
        #[arg(long)]
        candidates: PathBuf,

        /// Number of queries
        #[arg(long)]
        qn: usize,

        /// Ground truth depth
        #[arg(long, default_value_t = MAXK)]
        depth: usize,

        /// Recall cut-offs (defaults to 1,2,5,10,20,50,100)
        #[arg(long, value_delimiter = ',')]
        k: Vec<usize>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the norm distribution of a data set
    Norms {
        #[command(flatten)]
        data: DataArgs,

        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct DataArgs {
    /// Data set
    #[arg(long)]
    data: PathBuf,

    /// Number of data vectors
    #[arg(short)]
    n: usize,

    /// Dimensionality
    #[arg(short)]
    d: usize,

    /// Encoding of data and query files
    #[arg(long, value_enum, default_value_t = EncodingArg::Text)]
    encoding: EncodingArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EncodingArg {
    Text,
    Binary,
}

impl From<EncodingArg> for Encoding {
    fn from(e: EncodingArg) -> Self {
        match e {
            EncodingArg::Text => Encoding::Text,
            EncodingArg::Binary => Encoding::Binary,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Truth {
            data,
            query,
            qn,
            depth,
            out,
        } => run_truth(&data, &query, qn, depth, &out),
        Command::Eval {
            truth,
            candidates,
            qn,
            depth,
            k,
            json,
        } => run_eval(&truth, &candidates, qn, depth, &k, json),
        Command::Norms { data, out } => run_norms(&data, &out),
    }
}

fn load(path: &Path, n: usize, d: usize, encoding: EncodingArg) -> Result<VectorStore> {
    let report = VectorStore::load(path, n, d, encoding.into())
        .with_context(|| format!("loading {}", path.display()))?;
    info!(
        "Read {} ({} x {}): {:.6} Seconds",
        path.display(),
        n,
        d,
        report.elapsed.as_secs_f64()
    );
    Ok(report.store)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

fn run_truth(data_args: &DataArgs, query: &Path, qn: usize, depth: usize, out: &Path) -> Result<()> {
    let data = load(&data_args.data, data_args.n, data_args.d, data_args.encoding)?;
    let queries = load(query, qn, data_args.d, data_args.encoding)?;

    let report = GroundTruth::compute(&data, &queries, depth)?;
    ensure_parent(out)?;
    report
        .truth
        .write(out)
        .with_context(|| format!("writing {}", out.display()))?;

    info!(
        "Ground Truth: {:.6} Seconds ({} kernel evaluations, {:.2}% of candidates)",
        report.elapsed.as_secs_f64(),
        report.stats.evaluated,
        report.stats.evaluated_ratio() * 100.0
    );
    Ok(())
}

fn run_eval(truth: &Path, candidates: &Path, qn: usize, depth: usize, ks: &[usize], json: bool) -> Result<()> {
    let truth = GroundTruth::read(truth, qn, depth).with_context(|| format!("reading {}", truth.display()))?;
    let cand = std::fs::File::open(candidates)
        .map_err(mipscan::Error::from)
        .and_then(GroundTruth::read_from)
        .with_context(|| format!("reading {}", candidates.display()))?;
    if cand.len() != qn {
        bail!("{} holds {} queries, expected {qn}", candidates.display(), cand.len());
    }

    let ks = if ks.is_empty() { &RECALL_KS[..] } else { ks };
    let summary = RecallSummary::compute(ks, truth.results(), cand.results());

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("k\trecall(%)");
        for row in &summary.rows {
            println!("{}\t{:.2}", row.k, row.recall);
        }
    }
    Ok(())
}

fn run_norms(data_args: &DataArgs, out: &Path) -> Result<()> {
    let data = load(&data_args.data, data_args.n, data_args.d, data_args.encoding)?;
    let hist = data.norm_distribution(NORM_BUCKETS);
    info!(
        "m = {}, max_norm = {}, interval = {}",
        hist.counts.len(),
        hist.max_norm,
        hist.interval()
    );
    ensure_parent(out)?;
    hist.write(out).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

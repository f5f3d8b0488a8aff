//! Multi-threaded path analysis.
//!
//! The vertex range `[0, V)` is split into one contiguous block per worker;
//! the last block absorbs the remainder. Every worker owns its search state
//! and writes `<base>_<index>.csv`. The topology is shared read-only and no
//! output is merged.

use std::{
    ffi::OsString,
    fs::File,
    io::{self, BufWriter, Write},
    ops::Range,
    path::{Path, PathBuf},
};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::{prelude::*, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::{
    cost::{path_cost, path_length, PathStats},
    error::{AnalysisError, WorkerError},
    search::{PathSearch, PathSet},
    topology::{Asn, Topology},
};

pub const SINGLE_SOURCE_HEADER: &str = "from,to,length,cost";
pub const ALL_PAIRS_HEADER: &str =
    "from,to,avg length,min length,max length,avg cost,min cost,max cost";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Number of workers, one output file each.
    pub threads: usize,
    /// Output file prefix; may contain directories, which must exist.
    pub output_base: PathBuf,
    /// Draw one progress bar per worker on stderr.
    pub progress: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            threads: num_cpus::get().max(1),
            output_base: PathBuf::from("analysis"),
            progress: false,
        }
    }
}

impl AnalysisConfig {
    pub fn new(output_base: impl Into<PathBuf>) -> Self {
        AnalysisConfig {
            output_base: output_base.into(),
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_output_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.output_base = base.into();
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn output_path(&self, worker: usize) -> PathBuf {
        worker_output(&self.output_base, worker)
    }
}

/// `<base>_<worker>.csv`
pub fn worker_output(base: &Path, worker: usize) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("_{}.csv", worker));
    PathBuf::from(name)
}

/// Splits `[0, vertex_count)` into `threads` contiguous blocks of
/// `vertex_count / threads` vertices, the last one taking the remainder.
pub fn partition(vertex_count: usize, threads: usize) -> Vec<Range<usize>> {
    if threads == 0 {
        return Vec::new();
    }
    let split = vertex_count / threads;
    (0..threads)
        .map(|i| {
            let upper = if i == threads - 1 {
                vertex_count
            } else {
                split * (i + 1)
            };
            split * i..upper
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every valley-free path from one source to every other vertex.
    SingleSource(usize),
    /// Aggregated statistics for every ordered pair of vertices.
    AllPairs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub pairs_searched: usize,
    pub rows_written: usize,
}

#[derive(Debug)]
pub struct WorkerReport {
    pub index: usize,
    pub range: Range<usize>,
    pub output: PathBuf,
    pub outcome: Result<WorkerSummary, WorkerError>,
}

#[derive(Debug)]
pub struct AnalysisReport {
    /// Ordered by worker index.
    pub workers: Vec<WorkerReport>,
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        self.workers.iter().all(|w| w.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&WorkerReport, &WorkerError)> {
        self.workers
            .iter()
            .filter_map(|w| w.outcome.as_ref().err().map(|e| (w, e)))
    }

    pub fn rows_written(&self) -> usize {
        self.workers
            .iter()
            .filter_map(|w| w.outcome.as_ref().ok())
            .map(|s| s.rows_written)
            .sum()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.workers.iter().map(|w| w.output.as_path())
    }
}

/// Writes one `from,to,length,cost` row per valley-free path from `source`.
pub fn as_analysis(
    topo: &Topology,
    source: usize,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    if source >= topo.vertex_count() {
        return Err(AnalysisError::VertexOutOfRange {
            vertex: source,
            count: topo.vertex_count(),
        });
    }
    run(topo, Mode::SingleSource(source), config)
}

/// Writes one aggregated row per ordered AS pair joined by at least one
/// valley-free path.
pub fn graph_analysis(
    topo: &Topology,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    run(topo, Mode::AllPairs, config)
}

pub fn run(
    topo: &Topology,
    mode: Mode,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    if config.threads == 0 {
        return Err(AnalysisError::NoThreads);
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("vfree-worker-{}", i))
        .build()?;

    let ranges = partition(topo.vertex_count(), config.threads);
    let bars = progress_bars(&ranges, config.progress);
    info!(
        ?mode,
        vertices = topo.vertex_count(),
        threads = config.threads,
        base = %config.output_base.display(),
        "analysis started"
    );

    let workers = pool.install(|| {
        ranges
            .into_par_iter()
            .zip(bars)
            .enumerate()
            .map(|(index, (range, bar))| {
                let output = config.output_path(index);
                let outcome = Worker::new(topo, bar).run(mode, range.clone(), &output);
                match &outcome {
                    Ok(summary) => info!(
                        worker = index,
                        rows = summary.rows_written,
                        pairs = summary.pairs_searched,
                        "worker finished"
                    ),
                    Err(e) => warn!(worker = index, error = %e, "worker failed"),
                }
                WorkerReport {
                    index,
                    range,
                    output,
                    outcome,
                }
            })
            .collect::<Vec<_>>()
    });

    let report = AnalysisReport { workers };
    info!(
        rows = report.rows_written(),
        failed = report.failures().count(),
        "analysis finished"
    );
    Ok(report)
}

fn progress_bars(ranges: &[Range<usize>], enabled: bool) -> Vec<ProgressBar> {
    if !enabled {
        return ranges.iter().map(|_| ProgressBar::hidden()).collect();
    }
    let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    ranges
        .iter()
        .enumerate()
        .map(|(i, range)| {
            let bar = multi.add(ProgressBar::new(range.len() as u64));
            bar.set_style(style.clone());
            bar.set_message(format!("worker {}", i));
            bar
        })
        .collect()
}

/// `from,to,avg length,min length,max length,avg cost,min cost,max cost`, or
/// `None` when the pair has no paths.
pub fn pair_row(from: Asn, to: Asn, stats: &PathStats) -> Option<String> {
    let avg_length = stats.avg_length()?;
    let avg_cost = stats.avg_cost()?;
    Some(format!(
        "{},{},{:.3},{},{},{:.3},{},{}",
        from,
        to,
        avg_length,
        stats.length_min,
        stats.length_max,
        avg_cost,
        stats.cost_min,
        stats.cost_max
    ))
}

struct Worker<'a> {
    topo: &'a Topology,
    search: PathSearch<'a>,
    paths: PathSet,
    bar: ProgressBar,
}

impl<'a> Worker<'a> {
    fn new(topo: &'a Topology, bar: ProgressBar) -> Self {
        Worker {
            topo,
            search: PathSearch::new(topo),
            paths: PathSet::new(),
            bar,
        }
    }

    fn run(
        mut self,
        mode: Mode,
        range: Range<usize>,
        output: &Path,
    ) -> Result<WorkerSummary, WorkerError> {
        debug!(?range, output = %output.display(), "worker started");
        let file = File::create(output).map_err(|source| WorkerError::Create {
            path: output.to_path_buf(),
            source,
        })?;
        let mut out = BufWriter::new(file);

        let written = match mode {
            Mode::SingleSource(source) => self.single_source(source, range, &mut out),
            Mode::AllPairs => self.all_pairs(range, &mut out),
        };
        let summary = written
            .and_then(|summary| out.flush().map(|_| summary))
            .map_err(|source| WorkerError::Write {
                path: output.to_path_buf(),
                source,
            })?;
        self.bar.finish();
        Ok(summary)
    }

    fn reachable(&mut self, vertex: usize) -> bool {
        !self.search.neighbors(vertex).is_empty()
    }

    fn single_source(
        &mut self,
        source: usize,
        range: Range<usize>,
        out: &mut impl Write,
    ) -> io::Result<WorkerSummary> {
        let mut summary = WorkerSummary::default();
        writeln!(out, "{}", SINGLE_SOURCE_HEADER)?;

        let from = self.topo.label(source);
        for target in range {
            self.bar.inc(1);
            if target == source || !self.reachable(target) {
                continue;
            }
            self.paths.clear();
            self.search.iterative(source, target, &mut self.paths);
            summary.pairs_searched += 1;

            let to = self.topo.label(target);
            for path in &self.paths {
                writeln!(
                    out,
                    "{},{},{},{}",
                    from,
                    to,
                    path_length(path),
                    path_cost(self.topo, path)
                )?;
                summary.rows_written += 1;
            }
            debug!(from, to, paths = self.paths.len(), "pair searched");
        }
        Ok(summary)
    }

    fn all_pairs(&mut self, range: Range<usize>, out: &mut impl Write) -> io::Result<WorkerSummary> {
        let mut summary = WorkerSummary::default();
        writeln!(out, "{}", ALL_PAIRS_HEADER)?;

        let count = self.topo.vertex_count();
        for source in range {
            self.bar.inc(1);
            if !self.reachable(source) {
                continue;
            }
            let from = self.topo.label(source);
            for target in 0..count {
                if target == source || !self.reachable(target) {
                    continue;
                }
                self.paths.clear();
                self.search.iterative(source, target, &mut self.paths);
                summary.pairs_searched += 1;

                let stats = PathStats::from_paths(self.topo, &self.paths);
                if let Some(row) = pair_row(from, self.topo.label(target), &stats) {
                    writeln!(out, "{}", row)?;
                    summary.rows_written += 1;
                }
            }
        }
        Ok(summary)
    }
}

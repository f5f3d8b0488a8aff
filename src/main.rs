use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use valley_free_analysis::{
    analysis::{self, AnalysisConfig, AnalysisReport},
    degree_of_freedom, is_valley_free, open_snapshot, path_cost, AsRegistry, Asn, PathSearch,
    PathSet, Topology,
};

#[derive(Parser)]
#[command(name = "vfree")]
#[command(about = "Valley-free path analysis over CAIDA AS relationships", long_about = None)]
struct Cli {
    /// AS-to-vertex registry, loaded before the snapshot when present and
    /// saved afterwards
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print topology size and relationships
    Info {
        #[arg(long)]
        snapshot: PathBuf,
        /// Show providers, customers and peers of this AS
        #[arg(long)]
        asn: Option<Asn>,
        /// Print the neighbours of every AS
        #[arg(long)]
        adjacency: bool,
    },
    /// List valley-free paths between two ASes
    Paths {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        from: Asn,
        #[arg(long)]
        to: Asn,
        #[arg(long, value_enum, default_value_t = Strategy::Iterative)]
        strategy: Strategy,
        /// List every simple path, marking the valley-free ones
        #[arg(long)]
        all: bool,
    },
    /// Ratio of valley-free to non valley-free simple paths
    Dof {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        from: Asn,
        #[arg(long)]
        to: Asn,
    },
    /// Write every valley-free path from one AS to all others
    AnalyzeAs {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        asn: Asn,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Write path statistics for every pair of ASes
    AnalyzeGraph {
        #[arg(long)]
        snapshot: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Worker threads, one output file each [default: number of CPUs]
    #[arg(long)]
    threads: Option<usize>,
    /// Output prefix, files are named <BASE>_<worker>.csv
    #[arg(long, default_value = "analysis")]
    output: PathBuf,
    /// Show per-worker progress bars
    #[arg(long)]
    progress: bool,
}

impl RunArgs {
    fn config(&self) -> AnalysisConfig {
        let config = AnalysisConfig::new(self.output.clone()).with_progress(self.progress);
        match self.threads {
            Some(threads) => config.with_threads(threads),
            None => config,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Iterative,
    Recursive,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("VFREE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("valley_free_analysis=info,vfree=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = cli.registry.as_deref();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Commands::Info {
            snapshot,
            asn,
            adjacency,
        } => {
            let topo = load_topology(&snapshot, registry)?;
            writeln!(
                out,
                "{} ASes, {} edges",
                topo.vertex_count(),
                topo.edge_count()
            )?;
            if let Some(asn) = asn {
                let v = topo.require(asn)?;
                writeln!(out, "providers: {}", join(&topo.labels(&topo.providers_of(v))))?;
                writeln!(out, "customers: {}", join(&topo.labels(&topo.customers_of(v))))?;
                writeln!(out, "peers: {}", join(&topo.labels(&topo.peers_of(v))))?;
            }
            if adjacency {
                for v in 0..topo.vertex_count() {
                    let neighbors = topo.labels(&topo.neighbors(v));
                    writeln!(out, "{}: {}", topo.label(v), join(&neighbors))?;
                }
            }
        }
        Commands::Paths {
            snapshot,
            from,
            to,
            strategy,
            all,
        } => {
            let topo = load_topology(&snapshot, registry)?;
            let (v_from, v_to) = (topo.require(from)?, topo.require(to)?);
            let mut search = PathSearch::new(&topo);
            let mut paths = PathSet::new();

            if all {
                search.all_simple(v_from, v_to, &mut paths);
                for path in &paths {
                    let verdict = if is_valley_free(&topo, path) { "OK" } else { "NOPE" };
                    writeln!(out, "{} - {}", join(&topo.labels(path)), verdict)?;
                }
            } else {
                match strategy {
                    Strategy::Iterative => search.iterative(v_from, v_to, &mut paths),
                    Strategy::Recursive => search.recursive(v_from, v_to, &mut paths),
                }
                for path in &paths {
                    writeln!(
                        out,
                        "{} cost {}",
                        join(&topo.labels(path)),
                        path_cost(&topo, path)
                    )?;
                }
            }
            info!(from, to, paths = paths.len(), "search finished");
        }
        Commands::Dof { snapshot, from, to } => {
            let topo = load_topology(&snapshot, registry)?;
            let dof = degree_of_freedom(&topo, topo.require(from)?, topo.require(to)?);
            writeln!(out, "{}", dof)?;
        }
        Commands::AnalyzeAs { snapshot, asn, run } => {
            let topo = load_topology(&snapshot, registry)?;
            let source = topo.require(asn)?;
            let report = analysis::as_analysis(&topo, source, &run.config())
                .with_context(|| format!("analysis of AS{} failed", asn))?;
            summarize(&mut out, &report)?;
        }
        Commands::AnalyzeGraph { snapshot, run } => {
            let topo = load_topology(&snapshot, registry)?;
            let report = analysis::graph_analysis(&topo, &run.config())
                .context("graph analysis failed")?;
            summarize(&mut out, &report)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn load_topology(snapshot: &Path, registry: Option<&Path>) -> Result<Topology> {
    let mut ids = AsRegistry::new();
    if let Some(path) = registry.filter(|path| path.exists()) {
        let loaded = ids
            .load_from_path(path)
            .with_context(|| format!("cannot load registry {}", path.display()))?;
        info!(entries = loaded, path = %path.display(), "registry loaded");
    }

    let reader = open_snapshot(snapshot)
        .with_context(|| format!("cannot open snapshot {}", snapshot.display()))?;
    let topo = Topology::from_caida_with_registry(reader, ids)
        .with_context(|| format!("cannot parse snapshot {}", snapshot.display()))?;
    info!(
        ases = topo.vertex_count(),
        edges = topo.edge_count(),
        "topology loaded"
    );

    if let Some(path) = registry {
        topo.registry()
            .save_to_path(path)
            .with_context(|| format!("cannot save registry {}", path.display()))?;
    }
    Ok(topo)
}

fn summarize(out: &mut impl Write, report: &AnalysisReport) -> Result<()> {
    for worker in &report.workers {
        match &worker.outcome {
            Ok(summary) => writeln!(
                out,
                "{}: {} rows, {} pairs",
                worker.output.display(),
                summary.rows_written,
                summary.pairs_searched
            )?,
            Err(e) => writeln!(out, "{}: failed: {}", worker.output.display(), e)?,
        }
    }
    out.flush()?;

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{} of {} workers failed", failed, report.workers.len());
    }
    Ok(())
}

fn join(asns: &[Asn]) -> String {
    asns.iter()
        .map(|asn| asn.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

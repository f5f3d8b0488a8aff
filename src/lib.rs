//! valley-free-analysis builds an AS-level topology from CAIDA's
//! AS-relationship data and enumerates the paths between ASes that follow the
//! valley-free routing principle, scoring each one by how far it climbs or
//! descends the provider hierarchy.
//!
//! ```no_run
//! use valley_free_analysis::{dfs_vfree_it, open_snapshot, path_cost, Topology};
//!
//! let topo = Topology::from_caida(open_snapshot("20231201.as-rel.txt.bz2")?)?;
//! let (from, to) = (topo.require(3356)?, topo.require(15169)?);
//!
//! for path in &dfs_vfree_it(&topo, from, to) {
//!     println!("{:?} cost {}", topo.labels(path), path_cost(&topo, path));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod cost;
pub mod error;
pub mod hash;
pub mod policy;
pub mod registry;
pub mod search;
pub mod topology;
pub mod visited;

pub use analysis::{
    as_analysis, graph_analysis, AnalysisConfig, AnalysisReport, WorkerReport, WorkerSummary,
};
pub use cost::{degree_of_freedom, path_cost, path_length, DegreeOfFreedom, PathStats};
pub use error::{AnalysisError, RegistryError, TopologyError, VisitedError, WorkerError};
pub use policy::{is_valley_free, PolicyState};
pub use registry::AsRegistry;
pub use search::{all_simple_paths, dfs_vfree_it, dfs_vfree_rec, PathSearch, PathSet};
pub use topology::{open_snapshot, Asn, RelType, Topology};
pub use visited::VisitedSet;

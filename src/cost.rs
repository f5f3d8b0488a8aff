use std::fmt;

use crate::{
    policy::{hops, is_valley_free},
    search::{PathSearch, PathSet},
    topology::Topology,
};

/// Algebraic sum of the hop values along `path`: +1 up, 0 across, -1 down.
pub fn path_cost(topo: &Topology, path: &[usize]) -> i32 {
    hops(topo, path).map(|hop| hop.value()).sum()
}

/// Number of hops.
pub fn path_length(path: &[usize]) -> usize {
    path.len().saturating_sub(1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeOfFreedom {
    /// `valley_free / non_valley_free`. Positive infinity when only
    /// valley-free paths exist, NaN when there are no paths at all.
    pub ratio: f64,
    pub valley_free: usize,
    pub non_valley_free: usize,
}

impl fmt::Display for DegreeOfFreedom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "degree of freedom: {:.2}, vfree: {}, nvfree: {}",
            self.ratio, self.valley_free, self.non_valley_free
        )
    }
}

/// Classifies every simple path between `from` and `to`, not only the
/// valley-free ones the search strategies return.
pub fn degree_of_freedom(topo: &Topology, from: usize, to: usize) -> DegreeOfFreedom {
    let mut paths = PathSet::new();
    PathSearch::new(topo).all_simple(from, to, &mut paths);

    let valley_free = paths
        .iter()
        .filter(|path| is_valley_free(topo, path))
        .count();
    let non_valley_free = paths.len() - valley_free;

    DegreeOfFreedom {
        ratio: valley_free as f64 / non_valley_free as f64,
        valley_free,
        non_valley_free,
    }
}

/// Running count, sum, min and max of path length and cost for one AS pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStats {
    pub count: usize,
    pub length_sum: usize,
    pub length_min: usize,
    pub length_max: usize,
    pub cost_sum: i64,
    pub cost_min: i32,
    pub cost_max: i32,
}

impl Default for PathStats {
    fn default() -> Self {
        PathStats {
            count: 0,
            length_sum: 0,
            length_min: usize::MAX,
            length_max: 0,
            cost_sum: 0,
            cost_min: i32::MAX,
            cost_max: i32::MIN,
        }
    }
}

impl PathStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths(topo: &Topology, paths: &PathSet) -> Self {
        let mut stats = PathStats::new();
        for path in paths {
            stats.record(path_length(path), path_cost(topo, path));
        }
        stats
    }

    pub fn record(&mut self, length: usize, cost: i32) {
        self.count += 1;
        self.length_sum += length;
        self.length_min = self.length_min.min(length);
        self.length_max = self.length_max.max(length);
        self.cost_sum += i64::from(cost);
        self.cost_min = self.cost_min.min(cost);
        self.cost_max = self.cost_max.max(cost);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn avg_length(&self) -> Option<f64> {
        (self.count > 0).then(|| self.length_sum as f64 / self.count as f64)
    }

    pub fn avg_cost(&self) -> Option<f64> {
        (self.count > 0).then(|| self.cost_sum as f64 / self.count as f64)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topology::RelType;

    /*
     * ┌───────┐
     * │   1   │
     * └───┬───┘
     *     ▼
     * ┌───────┐    ┌───────┐
     * │   2   │◄──►│   3   │
     * └───────┘    └───┬───┘
     *                  ▼
     *              ┌───────┐
     *              │   4   │
     *              └───────┘
     */
    fn chain_topology() -> Topology {
        Topology::from_edges(vec![
            (1, 2, RelType::ProviderToCustomer),
            (2, 3, RelType::PeerToPeer),
            (3, 4, RelType::ProviderToCustomer),
        ])
    }

    fn path(topo: &Topology, asns: &[u32]) -> Vec<usize> {
        asns.iter().map(|&asn| topo.index_of(asn).unwrap()).collect()
    }

    #[test]
    fn test_single_hop_costs() {
        let topo = chain_topology();

        assert_eq!(path_cost(&topo, &path(&topo, &[1, 2])), -1);
        assert_eq!(path_cost(&topo, &path(&topo, &[2, 3])), 0);
        assert_eq!(path_cost(&topo, &path(&topo, &[2, 1])), 1);
    }

    #[test]
    fn test_cost_is_sum_of_hops() {
        let topo = chain_topology();

        assert_eq!(path_cost(&topo, &path(&topo, &[4, 3, 2, 1])), 2);
        assert_eq!(path_cost(&topo, &path(&topo, &[1, 2, 3, 4])), -2);
        assert_eq!(path_cost(&topo, &path(&topo, &[3])), 0);
        assert_eq!(path_length(&path(&topo, &[4, 3, 2, 1])), 3);
        assert_eq!(path_length(&[]), 0);
    }

    /*       ┌───────┐
     *       │   1   │
     *       └──┬─┬──┘
     *     ┌────┘ └────┐
     * ┌───▼───┐   ┌───▼───┐
     * │   2   ◄───►   3   │
     * └───┬───┘   └───┬───┘
     *     └────┐ ┌────┘
     *       ┌──▼─▼──┐
     *       │   4   │
     *       └───────┘
     */
    #[test]
    fn test_degree_of_freedom() {
        let topo = Topology::from_edges(vec![
            (1, 2, RelType::ProviderToCustomer),
            (1, 3, RelType::ProviderToCustomer),
            (3, 2, RelType::PeerToPeer),
            (3, 4, RelType::ProviderToCustomer),
            (2, 4, RelType::ProviderToCustomer),
        ]);
        let (v2, v3) = (topo.index_of(2).unwrap(), topo.index_of(3).unwrap());

        // 2-3 and 2-1-3 are valley-free, 2-4-3 is a valley
        let dof = degree_of_freedom(&topo, v2, v3);
        assert_eq!(dof.valley_free, 2);
        assert_eq!(dof.non_valley_free, 1);
        assert_eq!(dof.ratio, 2.0);
        assert_eq!(
            dof.to_string(),
            "degree of freedom: 2.00, vfree: 2, nvfree: 1"
        );
    }

    #[test]
    fn test_degree_of_freedom_without_valleys() {
        let topo = chain_topology();
        let (v1, v2) = (topo.index_of(1).unwrap(), topo.index_of(2).unwrap());

        let dof = degree_of_freedom(&topo, v1, v2);
        assert_eq!((dof.valley_free, dof.non_valley_free), (1, 0));
        assert!(dof.ratio.is_infinite() && dof.ratio > 0.0);
    }

    #[test]
    fn test_degree_of_freedom_without_paths() {
        let mut topo = chain_topology();
        let lonely = topo.add_vertex(5);

        let dof = degree_of_freedom(&topo, 0, lonely);
        assert_eq!((dof.valley_free, dof.non_valley_free), (0, 0));
        assert!(dof.ratio.is_nan());
    }

    #[test]
    fn test_stats_aggregate() {
        let mut stats = PathStats::new();
        assert!(stats.is_empty());
        assert_eq!(stats.avg_cost(), None);

        stats.record(2, -1);
        stats.record(3, -2);

        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg_length(), Some(2.5));
        assert_eq!((stats.length_min, stats.length_max), (2, 3));
        assert_eq!(stats.avg_cost(), Some(-1.5));
        assert_eq!((stats.cost_min, stats.cost_max), (-2, -1));
    }

    #[test]
    fn test_stats_from_paths() {
        let topo = chain_topology();
        let mut paths = PathSet::new();
        paths.push_path(&path(&topo, &[4, 3, 2]));
        paths.push_path(&path(&topo, &[2, 3]));

        let stats = PathStats::from_paths(&topo, &paths);
        assert_eq!(stats.count, 2);
        assert_eq!((stats.cost_min, stats.cost_max), (0, 1));
        assert_eq!((stats.length_min, stats.length_max), (1, 2));
    }
}

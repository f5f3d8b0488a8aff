//! Depth-first enumeration of simple paths between two vertices.
//!
//! Two strategies produce the same set of valley-free paths:
//!
//! - [`PathSearch::recursive`] re-checks the whole current path with
//!   [`is_valley_free`] before every descent.
//! - [`PathSearch::iterative`] keeps an explicit work stack whose frames carry
//!   the policy state reached at that vertex, so every hop is checked once
//!   with [`PolicyState::step`].
//!
//! Results are collected in a [`PathSet`]. Exploration order is not part of
//! the contract.

use tracing::trace;

use crate::{
    policy::{is_valley_free, next_state, PolicyState},
    topology::{LazyAdjacency, Topology},
    visited::VisitedSet,
};

/// Marks the end of every path in a [`PathSet`]. Never a vertex index.
pub const PATH_SEPARATOR: usize = usize::MAX;

/// Flat list of vertex indices, each path followed by [`PATH_SEPARATOR`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    flat: Vec<usize>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_path(&mut self, path: &[usize]) {
        self.flat.extend_from_slice(path);
        self.flat.push(PATH_SEPARATOR);
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.flat.iter().filter(|&&v| v == PATH_SEPARATOR).count()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn clear(&mut self) {
        self.flat.clear()
    }

    pub fn as_flat(&self) -> &[usize] {
        &self.flat
    }

    pub fn iter(&self) -> Paths<'_> {
        Paths { rest: &self.flat }
    }

    pub fn into_paths(self) -> Vec<Vec<usize>> {
        self.iter().map(|path| path.to_vec()).collect()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a [usize];
    type IntoIter = Paths<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Paths<'a> {
    rest: &'a [usize],
}

impl<'a> Iterator for Paths<'a> {
    type Item = &'a [usize];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .iter()
            .position(|&v| v == PATH_SEPARATOR)
            .unwrap_or(self.rest.len());
        let path = &self.rest[..end];
        self.rest = self.rest.get(end + 1..).unwrap_or(&[]);
        Some(path)
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    vertex: usize,
    state: PolicyState,
}

/// Reusable search context. Owns the adjacency cache and scratch buffers so a
/// worker can run any number of searches without sharing state.
pub struct PathSearch<'a> {
    topo: &'a Topology,
    adjacency: LazyAdjacency<'a>,
    visited: VisitedSet,
    path: Vec<usize>,
    stack: Vec<Frame>,
}

impl<'a> PathSearch<'a> {
    pub fn new(topo: &'a Topology) -> Self {
        PathSearch {
            topo,
            adjacency: LazyAdjacency::new(topo),
            visited: VisitedSet::new(),
            path: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn topology(&self) -> &'a Topology {
        self.topo
    }

    /// Neighbours of `vertex` through the cache.
    pub fn neighbors(&mut self, vertex: usize) -> &[usize] {
        self.adjacency.get(vertex)
    }

    fn reset(&mut self) {
        self.visited.clear();
        self.path.clear();
        self.stack.clear();
    }

    fn in_range(&self, from: usize, to: usize) -> bool {
        let count = self.topo.vertex_count();
        from < count && to < count
    }

    /// Appends every valley-free path `from -> to` to `out`, validating the
    /// whole path at each step.
    pub fn recursive(&mut self, from: usize, to: usize, out: &mut PathSet) {
        self.reset();
        if !self.in_range(from, to) {
            return;
        }
        self.path.push(from);
        let inserted = self.visited.insert(from);
        debug_assert!(inserted.is_ok());
        self.descend(to, out);
    }

    fn descend(&mut self, target: usize, out: &mut PathSet) {
        if !is_valley_free(self.topo, &self.path) {
            trace!(path = ?self.path, "pruned");
            return;
        }
        let last = match self.path.last() {
            Some(&last) => last,
            None => return,
        };
        if last == target {
            out.push_path(&self.path);
            return;
        }

        let degree = self.adjacency.get(last).len();
        for i in 0..degree {
            let next = self.adjacency.get(last)[i];
            if self.visited.insert(next).is_err() {
                continue;
            }
            self.path.push(next);
            self.descend(target, out);
            self.path.pop();
            let removed = self.visited.remove(next);
            debug_assert!(removed.is_ok());
        }
    }

    /// Appends every valley-free path `from -> to` to `out`, checking one hop
    /// at a time against the state stored in the parent frame.
    pub fn iterative(&mut self, from: usize, to: usize, out: &mut PathSet) {
        self.reset();
        if !self.in_range(from, to) {
            return;
        }
        // zero-hop path, same as `recursive`
        if from == to {
            out.push_path(&[from]);
            return;
        }

        self.path.push(from);
        let inserted = self.visited.insert(from);
        debug_assert!(inserted.is_ok());
        self.stack.push(Frame {
            vertex: from,
            state: PolicyState::Ascending,
        });
        self.expand(from, PolicyState::Ascending);

        while let Some(&Frame { vertex, state }) = self.stack.last() {
            if self.path.last() == Some(&vertex) {
                // every neighbour of the tail has been explored
                self.stack.pop();
                self.path.pop();
                let removed = self.visited.remove(vertex);
                debug_assert!(removed.is_ok());
                continue;
            }

            self.path.push(vertex);
            if vertex == to {
                out.push_path(&self.path);
                self.path.pop();
                self.stack.pop();
                continue;
            }

            let inserted = self.visited.insert(vertex);
            debug_assert!(inserted.is_ok());
            self.expand(vertex, state);
        }
    }

    fn expand(&mut self, vertex: usize, state: PolicyState) {
        let degree = self.adjacency.get(vertex).len();
        for i in 0..degree {
            let next = self.adjacency.get(vertex)[i];
            if self.visited.contains(next) {
                continue;
            }
            let reached = next_state(self.topo, state, vertex, next);
            if !reached.is_valid() {
                trace!(from = vertex, to = next, "hop breaks valley-free");
                continue;
            }
            self.stack.push(Frame {
                vertex: next,
                state: reached,
            });
        }
    }

    /// Appends every simple path `from -> to` to `out`, valley-free or not.
    pub fn all_simple(&mut self, from: usize, to: usize, out: &mut PathSet) {
        self.reset();
        if !self.in_range(from, to) {
            return;
        }
        self.path.push(from);
        let inserted = self.visited.insert(from);
        debug_assert!(inserted.is_ok());
        self.walk(to, out);
    }

    fn walk(&mut self, target: usize, out: &mut PathSet) {
        let last = match self.path.last() {
            Some(&last) => last,
            None => return,
        };
        if last == target {
            out.push_path(&self.path);
            return;
        }

        let degree = self.adjacency.get(last).len();
        for i in 0..degree {
            let next = self.adjacency.get(last)[i];
            if self.visited.insert(next).is_err() {
                continue;
            }
            self.path.push(next);
            self.walk(target, out);
            self.path.pop();
            let removed = self.visited.remove(next);
            debug_assert!(removed.is_ok());
        }
    }
}

pub fn dfs_vfree_rec(topo: &Topology, from: usize, to: usize) -> PathSet {
    let mut res = PathSet::new();
    PathSearch::new(topo).recursive(from, to, &mut res);
    res
}

pub fn dfs_vfree_it(topo: &Topology, from: usize, to: usize) -> PathSet {
    let mut res = PathSet::new();
    PathSearch::new(topo).iterative(from, to, &mut res);
    res
}

pub fn all_simple_paths(topo: &Topology, from: usize, to: usize) -> PathSet {
    let mut res = PathSet::new();
    PathSearch::new(topo).all_simple(from, to, &mut res);
    res
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;
    use crate::topology::{Asn, RelType};

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
    fn diamond_topology() -> Topology {
        Topology::from_edges(vec![
            (1, 2, RelType::ProviderToCustomer),
            (1, 3, RelType::ProviderToCustomer),
            (3, 2, RelType::PeerToPeer),
            (3, 4, RelType::ProviderToCustomer),
            (2, 4, RelType::ProviderToCustomer),
        ])
    }

    /*
     *  ┌─────┐      ┌─────┐
     *  │  1  ◄──────►  2  │
     *  └──┬──┘      └──┬──┘
     *     ▼            ▼
     *  ┌─────┐      ┌─────┐      ┌─────┐
     *  │  3  ◄──────►  4  ├─────►│  6  │
     *  └──┬──┘      └──┬──┘      └──▲──┘
     *     ▼            ▼            │
     *  ┌─────┐      ┌─────┐         │
     *  │  5  │      │  7  ├─────────┘
     *  └─────┘      └─────┘
     */
    fn meshed_topology() -> Topology {
        Topology::from_edges(vec![
            (1, 2, RelType::PeerToPeer),
            (1, 3, RelType::ProviderToCustomer),
            (2, 4, RelType::ProviderToCustomer),
            (3, 4, RelType::PeerToPeer),
            (3, 5, RelType::ProviderToCustomer),
            (4, 6, RelType::ProviderToCustomer),
            (4, 7, RelType::ProviderToCustomer),
            (7, 6, RelType::ProviderToCustomer),
        ])
    }

    fn as_paths(topo: &Topology, paths: &PathSet) -> HashSet<Vec<Asn>> {
        paths.iter().map(|path| topo.labels(path)).collect()
    }

    fn sorted(paths: &PathSet) -> Vec<Vec<usize>> {
        let mut paths = paths.clone().into_paths();
        paths.sort();
        paths
    }

    #[test]
    fn test_path_set_layout() {
        let mut set = PathSet::new();
        set.push_path(&[0, 1, 2]);
        set.push_path(&[3]);

        assert_eq!(set.as_flat(), &[0, 1, 2, PATH_SEPARATOR, 3, PATH_SEPARATOR]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![&[0usize, 1, 2][..], &[3usize][..]]);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn test_recursive_diamond() {
        let topo = diamond_topology();
        let v1 = topo.index_of(1).unwrap();
        let v2 = topo.index_of(2).unwrap();
        let v3 = topo.index_of(3).unwrap();
        let v4 = topo.index_of(4).unwrap();

        let paths = dfs_vfree_rec(&topo, v4, v1);
        assert_eq!(
            as_paths(&topo, &paths),
            [vec![4, 2, 1], vec![4, 3, 1]].into()
        );

        let paths = dfs_vfree_rec(&topo, v2, v3);
        assert_eq!(as_paths(&topo, &paths), [vec![2, 3], vec![2, 1, 3]].into());
    }

    #[test]
    fn test_iterative_diamond() {
        let topo = diamond_topology();
        let v1 = topo.index_of(1).unwrap();
        let v2 = topo.index_of(2).unwrap();
        let v3 = topo.index_of(3).unwrap();
        let v4 = topo.index_of(4).unwrap();

        let paths = dfs_vfree_it(&topo, v4, v1);
        assert_eq!(
            as_paths(&topo, &paths),
            [vec![4, 2, 1], vec![4, 3, 1]].into()
        );

        let paths = dfs_vfree_it(&topo, v2, v3);
        assert_eq!(as_paths(&topo, &paths), [vec![2, 3], vec![2, 1, 3]].into());
    }

    #[test]
    fn test_strategies_agree_on_every_pair() {
        for topo in [diamond_topology(), meshed_topology()] {
            let mut search = PathSearch::new(&topo);
            let (mut rec, mut it) = (PathSet::new(), PathSet::new());

            for from in 0..topo.vertex_count() {
                for to in 0..topo.vertex_count() {
                    rec.clear();
                    it.clear();
                    search.recursive(from, to, &mut rec);
                    search.iterative(from, to, &mut it);

                    assert_eq!(sorted(&rec), sorted(&it), "{} -> {}", from, to);
                    for path in &it {
                        assert!(is_valley_free(&topo, path));
                        let distinct: HashSet<_> = path.iter().collect();
                        assert_eq!(distinct.len(), path.len());
                        assert_eq!(path.first(), Some(&from));
                        assert_eq!(path.last(), Some(&to));
                    }
                }
            }
        }
    }

    #[test]
    fn test_meshed_paths() {
        let topo = meshed_topology();
        let v5 = topo.index_of(5).unwrap();
        let v6 = topo.index_of(6).unwrap();

        // 5 climbs to 3, may cross to 4 and descend, or climb to 1 first
        let paths = dfs_vfree_it(&topo, v5, v6);
        assert_eq!(
            as_paths(&topo, &paths),
            [
                vec![5, 3, 4, 6],
                vec![5, 3, 4, 7, 6],
                vec![5, 3, 1, 2, 4, 6],
                vec![5, 3, 1, 2, 4, 7, 6],
            ]
            .into()
        );
    }

    #[test]
    fn test_same_source_and_target() {
        let topo = diamond_topology();

        // both strategies report the zero-hop path
        assert_eq!(dfs_vfree_rec(&topo, 2, 2).into_paths(), vec![vec![2]]);
        assert_eq!(dfs_vfree_it(&topo, 2, 2).into_paths(), vec![vec![2]]);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let topo = diamond_topology();

        assert!(dfs_vfree_rec(&topo, 0, 17).is_empty());
        assert!(dfs_vfree_it(&topo, 17, 0).is_empty());
        assert!(all_simple_paths(&topo, 17, 17).is_empty());
    }

    #[test]
    fn test_isolated_vertex_has_no_paths() {
        let mut topo = diamond_topology();
        let lonely = topo.add_vertex(99);

        assert!(dfs_vfree_it(&topo, 0, lonely).is_empty());
        assert!(dfs_vfree_rec(&topo, lonely, 0).is_empty());
    }

    #[test]
    fn test_all_simple_paths_include_valleys() {
        let topo = diamond_topology();
        let (v2, v3) = (topo.index_of(2).unwrap(), topo.index_of(3).unwrap());

        let paths = all_simple_paths(&topo, v2, v3);
        assert_eq!(
            as_paths(&topo, &paths),
            [vec![2, 3], vec![2, 1, 3], vec![2, 4, 3]].into()
        );
    }

    #[test]
    fn test_context_is_reusable() {
        let topo = diamond_topology();
        let mut search = PathSearch::new(&topo);
        let mut first = PathSet::new();
        let mut second = PathSet::new();

        search.iterative(3, 0, &mut first);
        search.recursive(1, 2, &mut PathSet::new());
        search.iterative(3, 0, &mut second);

        assert_eq!(first, second);
    }
}

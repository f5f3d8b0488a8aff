use std::collections::BTreeSet;

use proptest::prelude::*;
use valley_free_analysis::{
    all_simple_paths, dfs_vfree_it, dfs_vfree_rec, is_valley_free, path_cost, path_length,
    policy::{next_state, replay},
    AsRegistry, PolicyState, RelType, Topology,
};

fn rel_type() -> impl Strategy<Value = RelType> {
    prop_oneof![
        Just(RelType::CustomerToProvider),
        Just(RelType::PeerToPeer),
        Just(RelType::ProviderToCustomer),
    ]
}

/// Up to seven ASes, so that the number of simple paths stays small.
fn edges() -> impl Strategy<Value = Vec<(u32, u32, RelType)>> {
    prop::collection::vec((1u32..8, 1u32..8, rel_type()), 1..14).prop_map(|edges| {
        edges
            .into_iter()
            .filter(|(asn1, asn2, _)| asn1 != asn2)
            .collect()
    })
}

fn pairs(topo: &Topology) -> impl Iterator<Item = (usize, usize)> {
    let count = topo.vertex_count();
    (0..count).flat_map(move |from| (0..count).map(move |to| (from, to)))
}

fn sorted(paths: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    let mut paths = paths;
    paths.sort();
    paths
}

/// C2P* then optionally one P2P or P2C, then P2C*.
fn valley_free_by_pattern(hops: &[RelType]) -> bool {
    let climb = hops
        .iter()
        .take_while(|&&hop| hop == RelType::CustomerToProvider)
        .count();
    match hops[climb..].split_first() {
        None => true,
        Some((_, rest)) => rest.iter().all(|&hop| hop == RelType::ProviderToCustomer),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn search_strategies_agree(edges in edges()) {
        let topo = Topology::from_edges(edges);
        for (from, to) in pairs(&topo) {
            let recursive = sorted(dfs_vfree_rec(&topo, from, to).into_paths());
            let iterative = sorted(dfs_vfree_it(&topo, from, to).into_paths());
            prop_assert_eq!(recursive, iterative, "{} -> {}", from, to);
        }
    }

    #[test]
    fn searched_paths_are_simple_and_valley_free(edges in edges()) {
        let topo = Topology::from_edges(edges);
        for (from, to) in pairs(&topo) {
            for path in &dfs_vfree_it(&topo, from, to) {
                prop_assert_eq!(path.first(), Some(&from));
                prop_assert_eq!(path.last(), Some(&to));
                prop_assert_eq!(path.iter().collect::<BTreeSet<_>>().len(), path.len());

                let incremental = path
                    .windows(2)
                    .fold(PolicyState::Ascending, |state, hop| {
                        next_state(&topo, state, hop[0], hop[1])
                    });
                prop_assert!(incremental.is_valid());
                prop_assert!(is_valley_free(&topo, path));
            }
        }
    }

    #[test]
    fn search_finds_every_valley_free_simple_path(edges in edges()) {
        let topo = Topology::from_edges(edges);
        for (from, to) in pairs(&topo).filter(|(from, to)| from != to) {
            let expected = all_simple_paths(&topo, from, to)
                .iter()
                .filter(|path| is_valley_free(&topo, path))
                .map(<[usize]>::to_vec)
                .collect::<Vec<_>>();
            let found = dfs_vfree_it(&topo, from, to).into_paths();
            prop_assert_eq!(sorted(expected), sorted(found));
        }
    }

    #[test]
    fn cost_is_sum_of_hop_values(edges in edges()) {
        let topo = Topology::from_edges(edges);
        for (from, to) in pairs(&topo).filter(|(from, to)| from != to) {
            for path in &all_simple_paths(&topo, from, to) {
                let expected: i32 = path
                    .windows(2)
                    .map(|hop| topo.hop(hop[0], hop[1]).value())
                    .sum();
                prop_assert_eq!(path_cost(&topo, path), expected);
                prop_assert_eq!(path_length(path), path.len() - 1);
                if path.len() == 2 {
                    prop_assert!((-1..=1).contains(&expected));
                }
            }
        }
    }

    #[test]
    fn replay_matches_pattern(hops in prop::collection::vec(rel_type(), 0..10)) {
        prop_assert_eq!(
            replay(hops.iter().copied()).is_valid(),
            valley_free_by_pattern(&hops)
        );
    }

    #[test]
    fn registry_round_trip(
        (asns, indices) in prop::collection::hash_set(any::<u32>(), 1..64)
            .prop_map(|asns| asns.into_iter().collect::<Vec<_>>())
            .prop_flat_map(|asns| {
                let indices = Just((0..asns.len()).collect::<Vec<_>>()).prop_shuffle();
                (Just(asns), indices)
            })
    ) {
        let mut registry = AsRegistry::new();
        for (&asn, &index) in asns.iter().zip(&indices) {
            registry.insert(asn, index).unwrap();
        }

        let mut saved = Vec::new();
        registry.save(&mut saved).unwrap();

        let mut loaded = AsRegistry::new();
        prop_assert_eq!(loaded.load(saved.as_slice()).unwrap(), asns.len());
        prop_assert_eq!(
            loaded.iter().collect::<BTreeSet<_>>(),
            registry.iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn ensure_is_stable(asns in prop::collection::vec(any::<u32>(), 1..64)) {
        let mut registry = AsRegistry::with_buckets(7);
        let first = asns.iter().map(|&asn| registry.ensure(asn)).collect::<Vec<_>>();
        let second = asns.iter().map(|&asn| registry.ensure(asn)).collect::<Vec<_>>();

        prop_assert_eq!(first, second);
        prop_assert_eq!(
            registry.count(),
            asns.iter().collect::<BTreeSet<_>>().len()
        );
    }
}

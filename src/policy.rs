//! Valley-free acceptance automaton.
//!
//! A valley-free path climbs zero or more customer-to-provider hops, takes at
//! most one peer-to-peer hop, then only descends provider-to-customer hops.
//!
//! ```text
//!               C2P                P2C
//!              ┌───┐              ┌───┐
//!              │   ▼   P2C, P2P   │   ▼   C2P, P2P
//!          Ascending ──────────► Descending ──────────► Invalid
//! ```

use crate::topology::{RelType, Topology};

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum PolicyState {
    Ascending,
    Descending,
    Invalid,
}

impl Default for PolicyState {
    fn default() -> Self {
        PolicyState::Ascending
    }
}

impl PolicyState {
    pub fn is_valid(&self) -> bool {
        *self != PolicyState::Invalid
    }

    /// Transition on one classified hop. `Invalid` absorbs everything.
    pub fn step(self, hop: RelType) -> PolicyState {
        match (self, hop) {
            (PolicyState::Ascending, RelType::CustomerToProvider) => PolicyState::Ascending,
            (PolicyState::Ascending, _) => PolicyState::Descending,
            (PolicyState::Descending, RelType::ProviderToCustomer) => PolicyState::Descending,
            _ => PolicyState::Invalid,
        }
    }
}

/// Replays the automaton over a sequence of classified hops.
pub fn replay(hops: impl IntoIterator<Item = RelType>) -> PolicyState {
    let mut state = PolicyState::Ascending;
    for hop in hops {
        state = state.step(hop);
        if !state.is_valid() {
            break;
        }
    }
    state
}

/// Hop classifications along `path`, using the stored edge kind or an
/// implicit upward hop.
pub fn hops<'a>(topo: &'a Topology, path: &'a [usize]) -> impl Iterator<Item = RelType> + 'a {
    path.windows(2).map(move |pair| topo.hop(pair[0], pair[1]))
}

/// Whole-path predicate. Paths with fewer than two vertices are trivially
/// valley-free.
pub fn is_valley_free(topo: &Topology, path: &[usize]) -> bool {
    replay(hops(topo, path)).is_valid()
}

/// Incremental form: state after walking `from -> to` in `state`.
pub fn next_state(topo: &Topology, state: PolicyState, from: usize, to: usize) -> PolicyState {
    state.step(topo.hop(from, to))
}

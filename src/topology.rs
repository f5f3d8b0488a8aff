use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use bzip2::read::BzDecoder;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
    Direction,
};
use tracing::debug;

use crate::{error::TopologyError, registry::AsRegistry};

pub type Asn = u32;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum RelType {
    CustomerToProvider,
    PeerToPeer,
    ProviderToCustomer,
}

impl RelType {
    /// Signed value of a hop: +1 going up, 0 across, -1 going down.
    pub fn value(&self) -> i32 {
        match self {
            RelType::CustomerToProvider => 1,
            RelType::PeerToPeer => 0,
            RelType::ProviderToCustomer => -1,
        }
    }
}

// Required to work as a edge
impl Default for RelType {
    fn default() -> Self {
        RelType::ProviderToCustomer
    }
}

/// AS-level topology.
///
/// Only `ProviderToCustomer` and `PeerToPeer` edges are stored; a peering is
/// stored once in each direction. A hop with no stored edge is an implicit
/// customer-to-provider hop. Vertex `i` of the graph is the AS the registry
/// maps to index `i`.
#[derive(Debug)]
pub struct Topology {
    pub graph: DiGraph<Asn, RelType>,
    registry: AsRegistry,
}

impl Topology {
    pub fn new() -> Self {
        Self::with_registry(AsRegistry::new())
    }

    /// Starts from a preloaded registry; every registered AS gets its vertex
    /// right away so vertex and registry numbering agree.
    pub fn with_registry(registry: AsRegistry) -> Self {
        let bound = registry.index_bound();
        let mut graph = DiGraph::with_capacity(bound, 0);
        // unused indices become isolated AS0 placeholders
        for index in 0..bound {
            graph.add_node(registry.asn_at(index).unwrap_or(0));
        }

        Topology { graph, registry }
    }

    pub fn from_edges(edges: Vec<(Asn, Asn, RelType)>) -> Self {
        let mut topo = Topology::new();
        for (asn1, asn2, rel) in edges {
            topo.add_relationship(asn1, asn2, rel);
        }
        topo
    }

    pub fn from_caida(reader: impl BufRead) -> Result<Self, TopologyError> {
        Self::from_caida_with_registry(reader, AsRegistry::new())
    }

    pub fn from_caida_with_registry(
        reader: impl BufRead,
        registry: AsRegistry,
    ) -> Result<Self, TopologyError> {
        let mut topo = Topology::with_registry(registry);

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            let fields = line.split('|').collect::<Vec<&str>>();
            if fields.len() < 3 {
                return Err(TopologyError::ParseError {
                    line: line_no,
                    message: format!("expected `<as1>|<as2>|<rel>`, found {:?}", line),
                });
            }
            let parse = |field: &str| {
                field
                    .trim()
                    .parse::<i64>()
                    .map_err(|source| TopologyError::ParseAsnError {
                        line: line_no,
                        source,
                    })
            };
            let asn1 = parse(fields[0])?;
            let asn2 = parse(fields[1])?;
            let rel = parse(fields[2])?;

            let (asn1, asn2) = match (Asn::try_from(asn1), Asn::try_from(asn2)) {
                (Ok(a), Ok(b)) => (a, b),
                _ => {
                    return Err(TopologyError::ParseError {
                        line: line_no,
                        message: format!("AS number out of range in {:?}", line),
                    })
                }
            };

            match rel {
                // asn1 and asn2 are peers
                0 => topo.add_relationship(asn1, asn2, RelType::PeerToPeer),

                // asn1 is a provider of asn2
                -1 => topo.add_relationship(asn1, asn2, RelType::ProviderToCustomer),

                _ => {
                    return Err(TopologyError::ParseError {
                        line: line_no,
                        message: format!("unknown relationship type {} in {}", rel, line),
                    })
                }
            }
        }

        debug!(
            vertices = topo.vertex_count(),
            edges = topo.edge_count(),
            "snapshot loaded"
        );
        Ok(topo)
    }

    /// Registers both ASes and stores the edges implied by `rel`.
    pub fn add_relationship(&mut self, asn1: Asn, asn2: Asn, rel: RelType) {
        let v1 = self.add_vertex(asn1);
        let v2 = self.add_vertex(asn2);
        match rel {
            RelType::ProviderToCustomer => self.add_edge(v1, v2, rel),
            RelType::CustomerToProvider => self.add_edge(v2, v1, RelType::ProviderToCustomer),
            RelType::PeerToPeer => {
                self.add_edge(v1, v2, rel);
                self.add_edge(v2, v1, rel);
            }
        }
    }

    /// Returns the vertex of `asn`, creating it on first sight.
    pub fn add_vertex(&mut self, asn: Asn) -> usize {
        let index = self.registry.ensure(asn);
        while self.graph.node_count() <= index {
            self.graph.add_node(0);
        }
        self.graph[NodeIndex::new(index)] = asn;
        index
    }

    pub fn add_edge(&mut self, from: usize, to: usize, kind: RelType) {
        self.graph
            .add_edge(NodeIndex::new(from), NodeIndex::new(to), kind);
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge_kind(&self, from: usize, to: usize) -> Option<RelType> {
        self.graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .map(|edge| self.graph[edge])
    }

    /// Classifies the hop `from -> to`; no stored edge means `from` is a
    /// customer of `to`.
    pub fn hop(&self, from: usize, to: usize) -> RelType {
        self.edge_kind(from, to)
            .unwrap_or(RelType::CustomerToProvider)
    }

    /// Adjacent vertices regardless of edge direction, ascending, without
    /// duplicates or self-loops.
    pub fn neighbors(&self, vertex: usize) -> Vec<usize> {
        if vertex >= self.vertex_count() {
            return Vec::new();
        }
        let mut neighbors = self
            .graph
            .neighbors_undirected(NodeIndex::new(vertex))
            .map(|n| n.index())
            .filter(|&n| n != vertex)
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    pub fn label(&self, vertex: usize) -> Asn {
        self.graph[NodeIndex::new(vertex)]
    }

    pub fn labels(&self, path: &[usize]) -> Vec<Asn> {
        path.iter().map(|&v| self.label(v)).collect()
    }

    pub fn index_of(&self, asn: Asn) -> Option<usize> {
        self.registry
            .lookup(asn)
            .filter(|&index| index < self.vertex_count())
    }

    pub fn require(&self, asn: Asn) -> Result<usize, TopologyError> {
        self.index_of(asn).ok_or(TopologyError::UnknownAsn(asn))
    }

    pub fn registry(&self) -> &AsRegistry {
        &self.registry
    }

    pub fn providers_of(&self, vertex: usize) -> Vec<usize> {
        // a provider holds a ProviderToCustomer edge towards us
        self.related(vertex, Direction::Incoming, RelType::ProviderToCustomer)
    }

    pub fn customers_of(&self, vertex: usize) -> Vec<usize> {
        self.related(vertex, Direction::Outgoing, RelType::ProviderToCustomer)
    }

    pub fn peers_of(&self, vertex: usize) -> Vec<usize> {
        self.related(vertex, Direction::Outgoing, RelType::PeerToPeer)
    }

    fn related(&self, vertex: usize, dir: Direction, rel: RelType) -> Vec<usize> {
        if vertex >= self.vertex_count() {
            return Vec::new();
        }
        let mut related = self
            .graph
            .edges_directed(NodeIndex::new(vertex), dir)
            .filter(|edge| edge.weight() == &rel)
            .map(|edge| match dir {
                Direction::Outgoing => edge.target().index(),
                Direction::Incoming => edge.source().index(),
            })
            .collect::<Vec<_>>();
        related.sort_unstable();
        related.dedup();
        related
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens a CAIDA snapshot, decompressing `.bz2` files on the fly.
pub fn open_snapshot(path: impl AsRef<Path>) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if path.extension().map_or(false, |ext| ext == "bz2") {
        Ok(Box::new(BufReader::new(BzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Per-vertex neighbour lists, computed on first use.
pub struct LazyAdjacency<'a> {
    topo: &'a Topology,
    lists: Vec<Option<Vec<usize>>>,
}

impl<'a> LazyAdjacency<'a> {
    pub fn new(topo: &'a Topology) -> Self {
        LazyAdjacency {
            topo,
            lists: vec![None; topo.vertex_count()],
        }
    }

    pub fn get(&mut self, vertex: usize) -> &[usize] {
        let topo = self.topo;
        match self.lists.get_mut(vertex) {
            Some(slot) => slot.get_or_insert_with(|| topo.neighbors(vertex)).as_slice(),
            None => &[],
        }
    }
}

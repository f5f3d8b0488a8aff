use valley_free_analysis::{degree_of_freedom, RelType, Topology};

fn main() {
    let topo = Topology::from_edges(vec![
        (1, 2, RelType::ProviderToCustomer),
        (1, 3, RelType::ProviderToCustomer),
        (2, 3, RelType::PeerToPeer),
        (2, 4, RelType::ProviderToCustomer),
        (3, 4, RelType::ProviderToCustomer),
    ]);

    let from = topo.index_of(4).unwrap();
    for asn in [1, 2, 3] {
        let to = topo.index_of(asn).unwrap();
        println!("4 -> {}: {}", asn, degree_of_freedom(&topo, from, to));
    }
}

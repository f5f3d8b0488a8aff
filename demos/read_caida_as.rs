use valley_free_analysis::{open_snapshot, Topology};

fn main() {
    let reader = open_snapshot("20231201.as-rel.txt.bz2").unwrap();
    let topo = Topology::from_caida(reader).unwrap();

    println!("Number of ases: {}", topo.vertex_count());
    println!("Number of edges: {}", topo.edge_count());
}

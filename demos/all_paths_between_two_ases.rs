use valley_free_analysis::{dfs_vfree_it, open_snapshot, path_cost, Topology};

fn main() {
    let topo = Topology::from_caida(open_snapshot("20231201.as-rel.txt.bz2").unwrap()).unwrap();

    let university_of_twente_asn = 1133;
    let universidade_de_sao_paulo_asn = 28571;

    let paths = dfs_vfree_it(
        &topo,
        topo.index_of(university_of_twente_asn).unwrap(),
        topo.index_of(universidade_de_sao_paulo_asn).unwrap(),
    );

    println!("Paths from UT to USP:");
    for path in &paths {
        println!("  {:?} cost {}", topo.labels(path), path_cost(&topo, path));
    }
}

use crate::{Dag, ToMermaid};
use color_eyre::eyre::{Report, Result};

/// A small graph shaped like one sample of the matrix workflow.
fn workflow() -> Result<Dag<String, String>, Report> {
    let edges = [
        ("convert_run1", "merge_runs", "run1.h5"),
        ("convert_run2", "merge_runs", "run2.h5"),
        ("merge_runs", "merge_protocols", "DpnII/matrix.h5"),
        ("merge_protocols", "correct", "matrix.h5"),
        ("correct", "plot_matrix", "corrected.h5"),
        ("correct", "find_tads", "corrected.h5"),
    ];
    Dag::from_edges(edges.map(|(s, t, e)| (s.to_string(), t.to_string(), e.to_string())))
}

#[test]
fn topological_order_respects_dependencies() -> Result<(), Report> {
    let dag = workflow()?;
    let order = dag.topological_order()?;
    assert_eq!(order.len(), dag.len());

    let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
    for (source, target, _) in dag.get_edges()? {
        assert!(position(source) < position(target), "{source} must run before {target}");
    }
    Ok(())
}

#[test]
fn ancestors_of_leaf() -> Result<(), Report> {
    let dag = workflow()?;
    let observed = dag.get_ancestors(&"find_tads".to_string())?;
    let expected = ["convert_run1", "merge_runs", "convert_run2", "merge_protocols", "correct"];
    let observed: Vec<&str> = observed.iter().map(|s| s.as_str()).collect();
    assert_eq!(observed, expected);
    Ok(())
}

#[test]
fn shared_ancestors_are_listed_once() -> Result<(), Report> {
    let dag = Dag::from_edges([("A", "B", 1), ("A", "C", 1), ("B", "D", 1), ("C", "D", 1)])?;
    assert_eq!(dag.get_ancestors(&"D")?, [&"A", &"B", &"C"]);
    assert_eq!(dag.get_ancestors(&"B")?, [&"A"]);
    Ok(())
}

#[test]
fn roots_are_conversions() -> Result<(), Report> {
    let dag = workflow()?;
    assert_eq!(dag.get_roots()?, [&"convert_run1".to_string(), &"convert_run2".to_string()]);
    Ok(())
}

#[test]
fn cycle_is_rejected_and_graph_unchanged() -> Result<(), Report> {
    let mut dag = workflow()?;
    let edges = dag.get_edges()?.len();
    let result = dag.add_edge("find_tads".to_string(), "convert_run1".to_string(), "x".to_string());
    assert!(result.is_err());
    assert_eq!(dag.get_edges()?.len(), edges);
    assert!(dag.topological_order().is_ok());
    Ok(())
}

#[test]
fn repeated_edge_is_updated() -> Result<(), Report> {
    let mut dag: Dag<&str, &str> = Dag::new();
    dag.add_edge("A", "B", "first")?;
    dag.add_edge("A", "B", "second")?;
    assert_eq!(dag.get_edges()?, [(&"A", &"B", &"second")]);
    Ok(())
}

#[test]
fn empty_graph() -> Result<(), Report> {
    let dag: Dag<&str, &str> = Dag::default();
    assert!(dag.is_empty());
    assert!(dag.topological_order()?.is_empty());
    assert_eq!(dag.to_mermaid()?, "graph LR;\n");
    Ok(())
}

#[test]
fn unknown_node_is_an_error() {
    let dag: Dag<&str, &str> = Dag::new();
    assert!(dag.get_parents(&"missing").is_err());
    assert!(dag.get_ancestors(&"missing").is_err());
}

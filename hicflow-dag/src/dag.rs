use crate::ToMermaid;

use color_eyre::eyre::{eyre, Report, Result};
use itertools::Itertools;
use petgraph::algo::has_path_connecting;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{EdgeIndex, EdgeReference, Graph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A directed acyclic graph ([`Dag`]).
///
/// - The nodes (`N`) must be unique, they are looked up by value (ex. a job name).
/// - The edges (`E`) are any displayable data attached to a dependency (ex. a file path).
/// - An edge goes from the node that must run first (source) to the node that depends on it (target).
#[derive(Clone, Debug)]
pub struct Dag<N, E> {
    /// Directed graph of nodes (`N`) and edges (`E`).
    pub graph: Graph<N, E>,
    index: HashMap<N, NodeIndex>,
}

impl<N, E> Default for Dag<N, E>
where
    N: Clone + Debug + Display + Eq + Hash,
    E: Debug + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Dag<N, E>
where
    N: Clone + Debug + Display + Eq + Hash,
    E: Debug + Display,
{
    /// Returns a new empty [`Dag`] with nodes (`N`) and edges (`E`).
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use hicflow_dag::Dag;
    /// let mut dag: Dag<&str, u32> = Dag::new();
    /// dag.add_edge("N1", "N2", 1234)?;
    /// # assert_eq!(dag.get_nodes(), [&"N1", &"N2"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new() -> Self {
        Dag { graph: Graph::new(), index: HashMap::new() }
    }

    /// Returns a [`Dag`] created from an iterable of (source, target, edge) tuples.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use hicflow_dag::Dag;
    /// let dag = Dag::from_edges([("A", "B", 1), ("A", "C", 3), ("B", "C", 2)])?;
    /// # assert_eq!(dag.get_nodes(), [&"A", &"B", &"C"]);
    /// assert!(Dag::from_edges([("A", "B", 1), ("B", "A", 2)]).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_edges<I>(edges: I) -> Result<Self, Report>
    where
        I: IntoIterator<Item = (N, N, E)>,
    {
        let mut dag = Dag::new();
        edges.into_iter().try_for_each(|(source, target, edge)| {
            dag.add_edge(source, target, edge)?;
            Ok::<(), Report>(())
        })?;
        Ok(dag)
    }

    /// Creates an edge (`E`) from the source node to the target node (`N`) and returns the [`EdgeIndex`].
    ///
    /// - If the source and target nodes don't exist yet in the graph, these nodes are created.
    /// - If an edge already exists between source and target, the edge is updated.
    /// - If the new edge would create a cycle, returns an Error and the edge is not added.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let mut dag = hicflow_dag::Dag::new();
    /// dag.add_edge("B", "C", 1)?;
    /// dag.add_edge("A", "B", 2)?;
    /// assert!(dag.add_edge("C", "A", 3).is_err());
    /// assert!(dag.add_edge("A", "A", 4).is_err());
    /// # assert_eq!(dag.get_nodes(), [&"B", &"C", &"A"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_edge(&mut self, source: N, target: N, edge: E) -> Result<EdgeIndex, Report> {
        let source_i = self.add_node(source);
        let target_i = self.add_node(target);

        // any path back from target to source would be closed by this edge
        if has_path_connecting(&self.graph, target_i, source_i, None) {
            let source = self.get_node(&source_i)?;
            let target = self.get_node(&target_i)?;
            return Err(eyre!("New edge between {source} and {target} introduced a cycle."));
        }

        Ok(self.graph.update_edge(source_i, target_i, edge))
    }

    /// Adds a new node (`N`) to the [`Dag`] and returns the [`NodeIndex`].
    ///
    /// If the node already exists, returns the existing [`NodeIndex`].
    ///
    /// ```rust
    /// use hicflow_dag::Dag;
    /// use petgraph::graph::NodeIndex;
    ///
    /// let mut dag: Dag<&str, u32> = Dag::new();
    /// let a_i = dag.add_node("A");
    /// let b_i = dag.add_node("B");
    /// assert_eq!(dag.add_node("B"), NodeIndex::new(1));
    /// # assert_eq!(a_i, NodeIndex::new(0));
    /// # assert_eq!(b_i, NodeIndex::new(1));
    /// ```
    pub fn add_node(&mut self, node: N) -> NodeIndex {
        match self.index.get(&node) {
            Some(node_index) => *node_index,
            None => {
                let node_index = self.graph.add_node(node.clone());
                self.index.insert(node, node_index);
                node_index
            }
        }
    }

    /// Returns all nodes (`N`) that the node depends on, directly or indirectly.
    ///
    /// Nodes are returned in insertion order, the node itself is not included.
    ///
    /// ```rust
    /// let dag = hicflow_dag::Dag::from_edges([("A", "B", 1), ("B", "C", 1), ("X", "C", 1), ("C", "D", 1)])?;
    /// assert_eq!(dag.get_ancestors(&"C")?, [&"A", &"B", &"X"]);
    /// assert!(dag.get_ancestors(&"A")?.is_empty());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_ancestors(&self, node: &N) -> Result<Vec<&N>, Report> {
        let node_index = self.get_node_index(node)?;
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, node_index);
        let mut ancestors = Vec::new();

        while let Some(i) = dfs.next(reversed) {
            if i != node_index {
                ancestors.push(i);
            }
        }

        ancestors.into_iter().sorted().map(|i| self.get_node(&i)).collect()
    }

    /// Returns the direct children of a node (`N`), in insertion order.
    pub fn get_children(&self, node: &N) -> Result<Vec<&N>, Report> {
        self.get_neighbors(node, Direction::Outgoing)
    }

    /// Returns the direct parents of a node (`N`), in insertion order.
    ///
    /// ```rust
    /// let dag = hicflow_dag::Dag::from_edges([("A", "C", 1), ("B", "C", 1)])?;
    /// assert_eq!(dag.get_parents(&"C")?, [&"A", &"B"]);
    /// assert_eq!(dag.get_children(&"A")?, [&"C"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_parents(&self, node: &N) -> Result<Vec<&N>, Report> {
        self.get_neighbors(node, Direction::Incoming)
    }

    fn get_neighbors(&self, node: &N, direction: Direction) -> Result<Vec<&N>, Report> {
        let node_index = self.get_node_index(node)?;
        self.graph
            .neighbors_directed(node_index, direction)
            .sorted()
            .map(|i| self.get_node(&i))
            .collect()
    }

    /// Returns all edges as (source, target, edge) references, in insertion order.
    pub fn get_edges(&self) -> Result<Vec<(&N, &N, &E)>, Report> {
        self.graph
            .edge_references()
            .map(|e| {
                let source = self.get_node(&e.source())?;
                let target = self.get_node(&e.target())?;
                Ok::<_, Report>((source, target, e.weight()))
            })
            .collect()
    }

    /// Returns the node (`N`) stored at a [`NodeIndex`].
    pub fn get_node(&self, node_index: &NodeIndex) -> Result<&N, Report> {
        self.graph
            .node_weight(*node_index)
            .ok_or_else(|| eyre!("Failed to get node data for node index {node_index:?}"))
    }

    /// Returns the [`NodeIndex`] that corresponds to the node data.
    ///
    /// ```rust
    /// use petgraph::graph::NodeIndex;
    ///
    /// let dag = hicflow_dag::Dag::from_edges([("A", "B", 1), ("A", "C", 3)])?;
    /// assert_eq!(dag.get_node_index(&"B")?, NodeIndex::new(1));
    /// assert!(dag.get_node_index(&"X").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_node_index(&self, node: &N) -> Result<NodeIndex, Report> {
        self.index.get(node).copied().ok_or_else(|| eyre!("Failed to get node index of node {node}"))
    }

    /// Returns all nodes (`N`) in insertion order.
    pub fn get_nodes(&self) -> Vec<&N> {
        self.graph.node_weights().collect()
    }

    /// Returns the nodes (`N`) that have no parents.
    ///
    /// ```rust
    /// let dag = hicflow_dag::Dag::from_edges([("A", "C", 1), ("B", "C", 1), ("C", "D", 1)])?;
    /// assert_eq!(dag.get_roots()?, [&"A", &"B"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_roots(&self) -> Result<Vec<&N>, Report> {
        self.graph
            .node_indices()
            .filter(|i| self.graph.neighbors_directed(*i, Direction::Incoming).next().is_none())
            .map(|i| self.get_node(&i))
            .collect()
    }

    /// Returns true if the [`Dag`] has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the number of nodes in the [`Dag`].
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns all nodes (`N`) ordered so that every node comes after all of its parents.
    ///
    /// Among nodes that are ready at the same time, the earliest inserted comes first,
    /// so the order is stable for a given construction sequence.
    ///
    /// ```rust
    /// let dag = hicflow_dag::Dag::from_edges([("B", "C", 1), ("A", "B", 1), ("X", "C", 1)])?;
    /// assert_eq!(dag.topological_order()?, [&"A", &"B", &"X", &"C"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn topological_order(&self) -> Result<Vec<&N>, Report> {
        // petgraph's toposort does not break ties by insertion order, hence Kahn's algorithm here.
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|i| (i, self.graph.neighbors_directed(i, Direction::Incoming).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> =
            in_degree.iter().filter(|(_, d)| **d == 0).map(|(i, _)| Reverse(*i)).collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(self.get_node(&i)?);
            for child in self.graph.neighbors_directed(i, Direction::Outgoing).unique() {
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(child));
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(eyre!("Graph contains a cycle, no topological order exists."));
        }

        Ok(order)
    }

    /// Returns a [DOT](https://graphviz.org/doc/info/lang.html) [`String`] of the [`Dag`].
    ///
    /// ```rust
    /// let dag = hicflow_dag::Dag::from_edges([("A", "B", "a.h5")])?;
    /// let dot = dag.to_dot();
    /// assert!(dot.contains("label=\"A\""));
    /// assert!(dot.contains("0 -> 1"));
    /// assert!(dot.contains("label=\"a.h5\""));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn to_dot(&self) -> String {
        let config = &[Config::NodeNoLabel, Config::EdgeNoLabel];
        let edges = |_, e: EdgeReference<'_, E>| format!("label=\"{}\"", escape_quotes(e.weight()));
        let nodes = |_, (_i, node): (NodeIndex, &N)| format!("label=\"{}\"", escape_quotes(node));
        let dot = Dot::with_attr_getters(&self.graph, config, &edges, &nodes).to_string();

        // add direction LR
        dot.replace("digraph {", "digraph {\n    rankdir=\"LR\"")
    }
}

impl<N, E> ToMermaid for Dag<N, E>
where
    N: Clone + Debug + Display + Eq + Hash,
    E: Debug + Display,
{
    /// Returns a [Mermaid](https://mermaid.js.org/) [`str`] created from a [`Dag`].
    ///
    /// ```rust
    /// use hicflow_dag::{Dag, ToMermaid};
    /// let dag = Dag::from_edges([("A", "B", 1)])?;
    /// assert_eq!(dag.to_mermaid()?, "graph LR;\n    0[\"A\"];\n    1[\"B\"];\n    0-->|\"1\"|1;\n");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn to_mermaid(&self) -> Result<String, Report> {
        let mut mermaid = String::from("graph LR;\n");

        for i in self.graph.node_indices() {
            let label = self.get_node(&i)?.to_string().replace('"', "#quot;");
            mermaid.push_str(&format!("    {}[\"{label}\"];\n", i.index()));
        }

        for e in self.graph.edge_references() {
            let label = e.weight().to_string().replace('"', "#quot;");
            let (source, target) = (e.source().index(), e.target().index());
            mermaid.push_str(&format!("    {source}-->|\"{label}\"|{target};\n"));
        }

        Ok(mermaid)
    }
}

fn escape_quotes<T: Display + ?Sized>(value: &T) -> String {
    value.to_string().replace('"', "\\\"")
}

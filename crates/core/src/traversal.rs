//! Traversal engine - bounded, bidirectional breadth-first expansion around seed nodes

use crate::graph::Graph;
use crate::node::{Node, Relation};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A node in a traversal result, marked when it was one of the seeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightedNode {
    #[serde(flatten)]
    pub node: Node,
    pub highlighted: bool,
}

/// The subgraph reached from the seeds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraversalResult {
    /// Visited nodes in graph insertion order
    pub nodes: Vec<HighlightedNode>,
    /// Explored edges in traversal order, direction preserved
    pub relations: Vec<Relation>,
}

impl TraversalResult {
    /// True when no seed was found in the graph
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.node.id == id)
    }
}

/// Directed adjacency over the nodes of a [`Graph`].
///
/// Relations with an endpoint missing from the graph are left out.
struct AdjacencyView<'g> {
    graph: &'g Graph,
    edges: Vec<(usize, usize, &'g Relation)>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl<'g> AdjacencyView<'g> {
    fn new(graph: &'g Graph) -> Self {
        let n = graph.node_count();
        let mut view = Self {
            graph,
            edges: Vec::with_capacity(graph.relation_count()),
            outgoing: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
        };

        for relation in graph.relations() {
            let (Some(source), Some(target)) = (
                graph.position(&relation.source),
                graph.position(&relation.target),
            ) else {
                continue;
            };
            let edge = view.edges.len();
            view.edges.push((source, target, relation));
            view.outgoing[source].push(edge);
            view.incoming[target].push(edge);
        }

        view
    }

    fn incident(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.outgoing[node]
            .iter()
            .chain(self.incoming[node].iter())
            .copied()
    }
}

/// Multi-source BFS from `seeds`, following edges in both directions up to `hops` steps.
///
/// Every node and edge is visited at most once. A node at distance `d < hops`
/// explores all of its incident edges; neighbors are enqueued at `d + 1`.
/// With `hops == 0` only the seeds themselves are returned.
pub fn traverse(graph: &Graph, seeds: &HashSet<String>, hops: usize) -> TraversalResult {
    let view = AdjacencyView::new(graph);
    let n = graph.node_count();

    let mut starts: Vec<usize> = seeds.iter().filter_map(|id| graph.position(id)).collect();
    starts.sort_unstable();
    if starts.is_empty() {
        return TraversalResult::default();
    }

    let mut visited = vec![false; n];
    let mut explored = vec![false; view.edges.len()];
    let mut relations = Vec::new();
    let mut queue = VecDeque::new();

    for start in starts {
        visited[start] = true;
        queue.push_back((start, 0usize));
    }

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= hops {
            continue;
        }

        for edge in view.incident(current) {
            if explored[edge] {
                continue;
            }
            explored[edge] = true;

            let (source, target, relation) = view.edges[edge];
            relations.push(relation.clone());

            let neighbor = if source == current { target } else { source };
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    let nodes = view
        .graph
        .nodes()
        .iter()
        .zip(visited)
        .filter(|(_, seen)| *seen)
        .map(|(node, _)| HighlightedNode {
            highlighted: seeds.contains(&node.id),
            node: node.clone(),
        })
        .collect();

    TraversalResult { nodes, relations }
}

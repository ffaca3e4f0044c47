//! Module for creating and analysing the category dependency graph
use crate::registry::dependency::{CategoryNode, CrossReference, Dependency};
use anyhow::Result;
use petgraph::Directed;
use petgraph::algo::toposort;
use petgraph::dot::Dot;
use petgraph::graph::{EdgeReference, Graph};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write as IoWrite;
use std::path::Path;

/// A graph of cross-references between categories.
///
/// There is an edge from A to B if fragments of A refer to the selected fragment of B.
pub type CategoryGraph = Graph<CategoryNode, Dependency, Directed>;

/// The file name used when saving the graph
const GRAPH_FILE_NAME: &str = "category_dependencies.dot";

/// Creates a directed graph from a list of cross-references
pub fn build_category_graph(cross_references: &[CrossReference]) -> CategoryGraph {
    let mut graph = Graph::new();
    let mut node_index = HashMap::new();
    for xref in cross_references {
        let dependent = CategoryNode::Scenario(xref.dependent);
        let dependency = xref.dependency.node();
        let source = *node_index
            .entry(dependent)
            .or_insert_with(|| graph.add_node(dependent));
        let target = *node_index
            .entry(dependency)
            .or_insert_with(|| graph.add_node(dependency));
        graph.add_edge(source, target, xref.dependency);
    }

    graph
}

/// The order in which to check categories: every category comes after those it depends on.
///
/// # Panics
///
/// If the graph contains a cycle.
pub fn check_order(graph: &CategoryGraph) -> Vec<CategoryNode> {
    let Ok(mut order) = toposort(graph, None) else {
        panic!("Category dependency graph contains a cycle");
    };

    // Dependents come first in topological order, so reverse to put leaves first
    order.reverse();
    order.into_iter().map(|index| graph[index]).collect()
}

/// Gets custom DOT attributes for edges in a category graph
fn get_edge_attributes(_: &CategoryGraph, edge_ref: EdgeReference<Dependency>) -> String {
    match edge_ref.weight() {
        // Use dashed lines for references into project sub-categories
        Dependency::SubFragment(_) => "style=dashed".to_string(),
        _ => String::new(),
    }
}

/// Saves the category graph to file.
///
/// The graph is saved in DOT format in the specified output directory.
pub fn save_category_graph(graph: &CategoryGraph, output_path: &Path) -> Result<()> {
    let dot = Dot::with_attr_getters(graph, &[], &get_edge_attributes, &|_, _| String::new());
    let mut file = File::create(output_path.join(GRAPH_FILE_NAME))?;
    write!(file, "{dot}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::SubscenarioCategory;
    use crate::registry::dependency::CROSS_REFERENCES;
    use crate::store::ProjectSubcategory;
    use std::fs;
    use tempfile::tempdir;

    fn position(order: &[CategoryNode], node: CategoryNode) -> usize {
        order.iter().position(|n| *n == node).unwrap()
    }

    #[test]
    fn leaves_come_first() {
        let graph = build_category_graph(CROSS_REFERENCES);
        let order = check_order(&graph);
        assert_eq!(order.len(), graph.node_count());

        for xref in CROSS_REFERENCES {
            assert!(
                position(&order, xref.dependency.node())
                    < position(&order, CategoryNode::Scenario(xref.dependent))
            );
        }
    }

    #[test]
    fn nodes_are_shared() {
        let graph = build_category_graph(CROSS_REFERENCES);
        let portfolio = CategoryNode::Scenario(SubscenarioCategory::ProjectPortfolio);
        assert_eq!(
            graph
                .node_weights()
                .filter(|node| **node == portfolio)
                .count(),
            1
        );
    }

    #[test]
    #[should_panic(expected = "Category dependency graph contains a cycle")]
    fn cycle_panics() {
        let graph = build_category_graph(&[
            CrossReference {
                dependent: SubscenarioCategory::ProjectLoadZones,
                dependency: Dependency::ZonesWithin(SubscenarioCategory::LoadZones),
            },
            CrossReference {
                dependent: SubscenarioCategory::LoadZones,
                dependency: Dependency::EntitiesWithin(SubscenarioCategory::ProjectLoadZones),
            },
        ]);
        check_order(&graph);
    }

    #[test]
    fn save_graph() {
        let dir = tempdir().unwrap();
        let graph = build_category_graph(CROSS_REFERENCES);
        save_category_graph(&graph, dir.path()).unwrap();

        let dot = fs::read_to_string(dir.path().join(GRAPH_FILE_NAME)).unwrap();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains(
            &CategoryNode::Project(ProjectSubcategory::HeatRateCurves).to_string()
        ));
        assert!(dot.contains("style=dashed"));
    }
}

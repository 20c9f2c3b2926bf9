//! Dependency resolution
//!
//! Computes which projects must be built, and in what order, before a
//! requested project can be built. Projects already built in this run are
//! skipped. Missing ids and cycles are rejected before anything is built.

use crate::core::project::ProjectGraph;
use crate::error::ResolverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Build order for `root`: unbuilt dependencies first, `root` last
///
/// Dependencies are visited left to right in declaration order, so for
/// `a -> [b, c]` where `b -> [d]` the order is `d, b, c, a`. If `root` is
/// already built the order is empty.
pub fn build_order(graph: &ProjectGraph, root: usize) -> Result<Vec<usize>, ResolverError> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut order = Vec::new();

    if graph.is_built(root) {
        return Ok(order);
    }

    // (node, index of the next dependency to visit)
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    marks[root] = Mark::Visiting;

    while let Some(top) = stack.last_mut() {
        let (node, next) = *top;
        top.1 += 1;
        let project = graph.get(node);

        let Some(dep_id) = project.dependency_ids.get(next) else {
            stack.pop();
            marks[node] = Mark::Visited;
            order.push(node);
            continue;
        };

        let dep = graph
            .find(dep_id)
            .ok_or_else(|| ResolverError::MissingDependency {
                package: project.id.clone(),
                dependency: dep_id.clone(),
            })?;

        if graph.is_built(dep) {
            continue;
        }

        match marks[dep] {
            Mark::Visited => {}
            Mark::Visiting => {
                let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..]
                    .iter()
                    .map(|&(n, _)| graph.get(n).id.clone())
                    .collect();
                cycle.push(dep_id.clone());
                return Err(ResolverError::CircularDependency { cycle });
            }
            Mark::Unvisited => {
                marks[dep] = Mark::Visiting;
                stack.push((dep, 0));
            }
        }
    }

    Ok(order)
}

/// Check every project for missing dependencies and cycles
pub fn validate(graph: &ProjectGraph) -> Result<(), ResolverError> {
    for node in 0..graph.len() {
        build_order(graph, node)?;
    }
    Ok(())
}

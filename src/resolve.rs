//! Topological ordering of derived quantities and reactions.
//!
//! Each node carries the set of names its expression references. Edges exist
//! only towards names that are themselves nodes: variables and parameters are
//! always available and impose no order. Independent nodes keep their
//! declaration order, so repeated generation over an unchanged model emits
//! byte-identical output.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use crate::errors::CodegenError;

/// A named node of the dependency graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyNode<'a> {
    pub name: &'a str,
    pub references: BTreeSet<&'a str>,
}

/// Orders `nodes` so that every node follows all nodes it references.
///
/// Uses Kahn's algorithm with a min-heap on declaration position, which makes
/// ties resolve in declaration order.
///
/// # Arguments
/// * `nodes` - Graph nodes in declaration order
///
/// # Returns
/// Indices into `nodes` in emission order
///
/// # Errors
/// Returns `CodegenError::CyclicDependency` with the names along one cycle,
/// starting from the earliest declared node that could not be ordered.
pub fn resolve_order(nodes: &[DependencyNode<'_>]) -> Result<Vec<usize>, CodegenError> {
    let position: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.name, index))
        .collect();

    // dependencies[i]: nodes that i references, sorted and deduplicated
    let dependencies: Vec<Vec<usize>> = nodes
        .iter()
        .map(|node| {
            let mut deps: Vec<usize> = node
                .references
                .iter()
                .filter_map(|name| position.get(name).copied())
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut pending: Vec<usize> = vec![0; nodes.len()];
    for (node, deps) in dependencies.iter().enumerate() {
        pending[node] = deps.len();
        for &dep in deps {
            dependents[dep].push(node);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &dependent in &dependents[node] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() == nodes.len() {
        return Ok(order);
    }

    let cycle = trace_cycle(&dependencies, &pending)
        .into_iter()
        .map(|index| nodes[index].name.to_string())
        .collect();
    Err(CodegenError::CyclicDependency { cycle })
}

/// Follows stuck dependencies from the first stuck node until a node repeats.
///
/// Every stuck node has at least one stuck dependency, so the walk always
/// closes a loop.
fn trace_cycle(dependencies: &[Vec<usize>], pending: &[usize]) -> Vec<usize> {
    let stuck = |index: usize| pending[index] > 0;
    let Some(start) = (0..pending.len()).find(|&index| stuck(index)) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = dependencies[current].iter().find(|&&dep| stuck(dep)) else {
            return path;
        };
        if let Some(at) = path.iter().position(|&seen| seen == next) {
            return path.split_off(at);
        }
        path.push(next);
        current = next;
    }
}

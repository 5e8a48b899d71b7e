//! Pure reachability helpers over a [`StepGraph`].
//!
//! Step graphs may loop ("add another item" patterns), so every walk here
//! carries a visited accumulator and never descends into a step twice.
//! Dangling targets are tolerated: they appear in results but contribute no
//! successors of their own.

use super::graph::StepGraph;

/// Routes whose `next` or any fork target is `route`, in declaration order.
pub fn route_steps(route: &str, steps: &StepGraph) -> Vec<String> {
    steps
        .iter()
        .filter(|(_, options)| {
            options.next.as_deref() == Some(route)
                || options.forks.iter().any(|fork| fork.target == route)
        })
        .map(|(path, _)| path.to_string())
        .collect()
}

/// Every route reachable from `step_name` by following `next` and fork
/// targets, starting with `step_name` itself.
///
/// When `accumulated` is supplied it is used as the visited set; steps
/// already in it are neither repeated nor explored.
pub fn all_possible_steps(
    step_name: &str,
    steps: &StepGraph,
    accumulated: Option<Vec<String>>,
) -> Vec<String> {
    let mut visited = accumulated.unwrap_or_else(|| vec![step_name.to_string()]);
    extend_possible_steps(step_name, steps, &mut visited);
    visited
}

fn extend_possible_steps(step_name: &str, steps: &StepGraph, visited: &mut Vec<String>) {
    let Some(options) = steps.get(step_name) else {
        return;
    };

    let mut new_steps: Vec<String> = Vec::new();
    for successor in options.successors() {
        if !visited.iter().any(|v| v == successor) && !new_steps.iter().any(|n| n == successor) {
            new_steps.push(successor.to_string());
        }
    }

    visited.extend(new_steps.iter().cloned());
    for step in &new_steps {
        extend_possible_steps(step, steps, visited);
    }
}

/// Depth-first walk recording `step_name` and every unvisited step
/// reachable from it into `visited`.
pub fn walk_all_possible_steps(step_name: &str, steps: &StepGraph, visited: &mut Vec<String>) {
    if visited.iter().any(|v| v == step_name) {
        return;
    }
    visited.push(step_name.to_string());

    if let Some(options) = steps.get(step_name) {
        for successor in options.successors() {
            walk_all_possible_steps(successor, steps, visited);
        }
    }
}

/// The set of steps reachable from `step_name`, including itself.
pub fn create_all_visited_steps(step_name: &str, steps: &StepGraph) -> Vec<String> {
    let mut visited = Vec::new();
    walk_all_possible_steps(step_name, steps, &mut visited);
    visited
}

/// True when following `target` can lead back to `current`.
pub fn is_loop(target: &str, current: &str, steps: &StepGraph) -> bool {
    all_possible_steps(target, steps, None)
        .iter()
        .any(|step| step == current)
}

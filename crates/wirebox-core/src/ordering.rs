//! Ordering solver for before/after constraints
//!
//! Shared by decorator chains and ordered contributions: given named items
//! with `before`/`after` constraint sets (where `*` means "every other
//! item"), produce one valid total order or fail with the constraint cycle.
//!
//! `X before Y` and `Y after X` are the same edge. Items with no constraints
//! keep their declaration order: the solver runs Kahn's algorithm and always
//! emits the ready item with the smallest declaration index, so the result
//! is deterministic and stable, never arbitrary.

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// The wildcard constraint name meaning "every other participant"
pub const WILDCARD: &str = "*";

/// One named item with its ordering constraints
#[derive(Debug, Clone, Default)]
pub struct ConstraintItem {
    /// Unique name among the items being solved
    pub name: String,
    /// Names this item must precede
    pub before: Vec<String>,
    /// Names this item must follow
    pub after: Vec<String>,
}

impl ConstraintItem {
    /// Create an unconstrained item
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Require this item to precede `name` (`*` for all others)
    pub fn before<S: Into<String>>(mut self, name: S) -> Self {
        self.before.push(name.into());
        self
    }

    /// Require this item to follow `name` (`*` for all others)
    pub fn after<S: Into<String>>(mut self, name: S) -> Self {
        self.after.push(name.into());
        self
    }
}

/// Solve the constraint set into one total order of names.
///
/// Fails with [`Error::OrderingConflict`] when the constraint graph contains
/// a cycle, and with [`Error::Assembly`] on duplicate item names. References
/// to names that are not part of the set are ignored.
pub fn solve(items: &[ConstraintItem]) -> Result<Vec<String>> {
    let n = items.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, item) in items.iter().enumerate() {
        if index.insert(item.name.as_str(), i).is_some() {
            return Err(Error::assembly(format!(
                "Duplicate ordering name '{}'",
                item.name
            )));
        }
    }

    // Direct edges first; wildcard expansion must not override them.
    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    let mut direct: HashSet<(usize, usize)> = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        for name in &item.before {
            if name == WILDCARD {
                continue;
            }
            match index.get(name.as_str()) {
                Some(&j) if j != i => {
                    edges.insert((i, j));
                    direct.insert(pair(i, j));
                }
                Some(_) => {}
                None => trace!(item = %item.name, reference = %name, "ignoring unknown ordering reference"),
            }
        }
        for name in &item.after {
            if name == WILDCARD {
                continue;
            }
            match index.get(name.as_str()) {
                Some(&j) if j != i => {
                    edges.insert((j, i));
                    direct.insert(pair(i, j));
                }
                Some(_) => {}
                None => trace!(item = %item.name, reference = %name, "ignoring unknown ordering reference"),
            }
        }
    }

    // Wildcards expand pairwise against every item not directly constrained
    // against the wildcard holder.
    for (i, item) in items.iter().enumerate() {
        if item.before.iter().any(|name| name == WILDCARD) {
            for j in 0..n {
                if j != i && !direct.contains(&pair(i, j)) {
                    edges.insert((i, j));
                }
            }
        }
        if item.after.iter().any(|name| name == WILDCARD) {
            for j in 0..n {
                if j != i && !direct.contains(&pair(i, j)) {
                    edges.insert((j, i));
                }
            }
        }
    }

    let mut indegree = vec![0usize; n];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(u, v) in &edges {
        successors[u].push(v);
        indegree[v] += 1;
    }

    let mut emitted = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for _ in 0..n {
        let next = (0..n).find(|&i| !emitted[i] && indegree[i] == 0);
        let Some(i) = next else {
            return Err(Error::ordering_conflict(find_cycle(
                items,
                &successors,
                &emitted,
            )));
        };
        emitted[i] = true;
        order.push(items[i].name.clone());
        for &v in &successors[i] {
            indegree[v] -= 1;
        }
    }
    Ok(order)
}

fn pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Extract one concrete cycle from the remaining (unemitted) nodes so the
/// error names its participants, ending by repeating the start.
fn find_cycle(items: &[ConstraintItem], successors: &[Vec<usize>], emitted: &[bool]) -> Vec<String> {
    let n = items.len();
    for start in 0..n {
        if emitted[start] {
            continue;
        }
        let mut visited = vec![false; n];
        let mut path = Vec::new();
        if let Some(cycle) = dfs_cycle(start, successors, emitted, &mut visited, &mut path) {
            return cycle.into_iter().map(|i| items[i].name.clone()).collect();
        }
    }
    // Unreachable when called from a stalled Kahn pass; report what is left.
    (0..n)
        .filter(|&i| !emitted[i])
        .map(|i| items[i].name.clone())
        .collect()
}

fn dfs_cycle(
    node: usize,
    successors: &[Vec<usize>],
    emitted: &[bool],
    visited: &mut Vec<bool>,
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    if let Some(pos) = path.iter().position(|&p| p == node) {
        let mut cycle: Vec<usize> = path[pos..].to_vec();
        cycle.push(node);
        return Some(cycle);
    }
    if visited[node] {
        return None;
    }
    visited[node] = true;
    path.push(node);
    for &next in &successors[node] {
        if emitted[next] {
            continue;
        }
        if let Some(cycle) = dfs_cycle(next, successors, emitted, visited, path) {
            return Some(cycle);
        }
    }
    path.pop();
    None
}

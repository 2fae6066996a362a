//! Directed graph over named nodes, used for dependency ordering and
//! cycle detection.
//!
//! Nodes are step names for step dependencies, or `step.option` pairs for
//! option references. Edges point from a node to the nodes it needs.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::error::{Result, StepforgeError};

/// Dependency relationships between named nodes.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Node name to its direct dependencies, in declaration order.
    dependencies: BTreeMap<String, Vec<String>>,
    /// Node name to the nodes that depend on it.
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, node: &str) -> Option<&[String]> {
        self.dependencies.get(node).map(Vec::as_slice)
    }

    /// Nodes that depend directly on the given node.
    pub fn dependents_of(&self, node: &str) -> Option<&BTreeSet<String>> {
        self.dependents.get(node)
    }

    pub fn contains(&self, node: &str) -> bool {
        self.dependencies.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Nodes in topological order (dependencies before dependents).
    ///
    /// Ties are broken by name, so the order is stable across runs.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(StepforgeError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut in_degree: HashMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(node, deps)| (node.as_str(), deps.len()))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(node, _)| *node)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut order = Vec::with_capacity(self.dependencies.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());
            if let Some(dependents) = self.dependents.get(node) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dependent.as_str());
                        }
                    }
                }
            }
        }

        Ok(order)
    }

    /// Find a cycle, returning its path with the first node repeated at
    /// the end (`a -> b -> a`).
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Visiting,
            Visited,
        }

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node);

            for dep in graph.dependencies.get(node).into_iter().flatten() {
                match state.get(dep.as_str()) {
                    Some(State::Visiting) => {
                        let start = path.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(dep.clone());
                        return Some(cycle);
                    }
                    Some(State::Visited) => {}
                    None => {
                        if let Some(cycle) = dfs(dep, graph, state, path) {
                            return Some(cycle);
                        }
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        let mut state: HashMap<&str, State> = HashMap::new();
        let mut path = Vec::new();
        for node in self.dependencies.keys() {
            if !state.contains_key(node.as_str()) {
                if let Some(cycle) = dfs(node, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

/// Builder for constructing a [`DependencyGraph`].
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    dependencies: BTreeMap<String, Vec<String>>,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its dependencies. Repeated calls extend the list.
    pub fn add_node<I, S>(mut self, name: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let deps = self.dependencies.entry(name.into()).or_default();
        for dep in depends_on {
            let dep = dep.into();
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        self
    }

    /// Build the graph.
    ///
    /// Dependencies on nodes that were never added become leaf nodes;
    /// callers validate names before building when that matters.
    pub fn build(mut self) -> DependencyGraph {
        let leaves: Vec<String> = self
            .dependencies
            .values()
            .flatten()
            .filter(|dep| !self.dependencies.contains_key(*dep))
            .cloned()
            .collect();
        for leaf in leaves {
            self.dependencies.entry(leaf).or_default();
        }

        let mut dependents: BTreeMap<String, BTreeSet<String>> = self
            .dependencies
            .keys()
            .map(|node| (node.clone(), BTreeSet::new()))
            .collect();
        for (node, deps) in &self.dependencies {
            for dep in deps {
                dependents.entry(dep.clone()).or_default().insert(node.clone());
            }
        }

        DependencyGraph {
            dependencies: self.dependencies,
            dependents,
        }
    }
}

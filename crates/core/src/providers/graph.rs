//! Deterministic provider load order.
//!
//! Stable Kahn's algorithm: at every step the eligible provider (all of its
//! dependencies already placed) with the lowest `order` goes next, ties broken
//! by discovery index. When the queue runs dry with providers left over, the
//! leftovers are searched for strongly connected components so the error
//! names every provider that sits on a cycle and nothing else.

use crate::errors::CoreError;
use crate::providers::ProviderMetadata;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Provider names in the order they register and boot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BootOrder {
    names: Vec<String>,
}

impl BootOrder {
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

impl<'a> IntoIterator for &'a BootOrder {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Dependency graph over a gated-in provider set
#[derive(Debug)]
pub struct ProviderGraph<'a> {
    providers: &'a [ProviderMetadata],
    /// dependencies[a] = providers `a` requires
    dependencies: Vec<Vec<usize>>,
    /// dependents[b] = providers that require `b`
    dependents: Vec<Vec<usize>>,
}

impl<'a> ProviderGraph<'a> {
    /// Build the graph. `gated_out` names providers that exist but were
    /// filtered by the gate; they only sharpen the error message.
    pub fn build(
        providers: &'a [ProviderMetadata],
        gated_out: &[String],
    ) -> Result<Self, CoreError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(providers.len());
        for (i, provider) in providers.iter().enumerate() {
            if index.insert(provider.name.as_str(), i).is_some() {
                return Err(CoreError::DuplicateProvider {
                    name: provider.name.clone(),
                });
            }
        }

        let mut dependencies = vec![Vec::new(); providers.len()];
        let mut dependents = vec![Vec::new(); providers.len()];

        for (i, provider) in providers.iter().enumerate() {
            for dependency in &provider.requires {
                let Some(&d) = index.get(dependency.as_str()) else {
                    return Err(CoreError::unresolved(
                        provider.name.clone(),
                        dependency.clone(),
                        gated_out.contains(dependency),
                    ));
                };
                if !dependencies[i].contains(&d) {
                    dependencies[i].push(d);
                    dependents[d].push(i);
                }
            }
        }

        Ok(Self {
            providers,
            dependencies,
            dependents,
        })
    }

    /// Compute the boot order
    pub fn order(&self) -> Result<BootOrder, CoreError> {
        let count = self.providers.len();
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();

        let mut ready: BinaryHeap<Reverse<(i32, usize)>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(i, _)| Reverse((self.providers[i].order, i)))
            .collect();

        let mut placed = vec![false; count];
        let mut names = Vec::with_capacity(count);

        while let Some(Reverse((_, current))) = ready.pop() {
            placed[current] = true;
            names.push(self.providers[current].name.clone());

            for &dependent in &self.dependents[current] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse((self.providers[dependent].order, dependent)));
                }
            }
        }

        if names.len() != count {
            let residual: Vec<bool> = placed.iter().map(|p| !p).collect();
            return Err(CoreError::CyclicDependency {
                members: self.cycle_members(&residual),
            });
        }

        Ok(BootOrder { names })
    }

    /// Providers on a cycle among the residual nodes, in discovery order
    fn cycle_members(&self, residual: &[bool]) -> Vec<String> {
        let mut tarjan = Tarjan::new(&self.dependencies, residual);
        for v in 0..self.providers.len() {
            if residual[v] && tarjan.indices[v].is_none() {
                tarjan.visit(v);
            }
        }

        let mut on_cycle = vec![false; self.providers.len()];
        for component in &tarjan.components {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&v| self.dependencies[v].contains(&v));
            if cyclic {
                for &v in component {
                    on_cycle[v] = true;
                }
            }
        }

        self.providers
            .iter()
            .zip(on_cycle)
            .filter(|(_, cyclic)| *cyclic)
            .map(|(provider, _)| provider.name.clone())
            .collect()
    }
}

/// Compute the boot order for an already gated provider set
pub fn boot_order(providers: &[ProviderMetadata]) -> Result<BootOrder, CoreError> {
    ProviderGraph::build(providers, &[])?.order()
}

/// Tarjan's strongly connected components, restricted to `active` nodes
struct Tarjan<'g> {
    edges: &'g [Vec<usize>],
    active: &'g [bool],
    next_index: usize,
    indices: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    components: Vec<Vec<usize>>,
}

impl<'g> Tarjan<'g> {
    fn new(edges: &'g [Vec<usize>], active: &'g [bool]) -> Self {
        let count = edges.len();
        Self {
            edges,
            active,
            next_index: 0,
            indices: vec![None; count],
            lowlink: vec![0; count],
            stack: Vec::new(),
            on_stack: vec![false; count],
            components: Vec::new(),
        }
    }

    /// Iterative depth-first search rooted at `root`; the call stack stays
    /// flat however long the dependency chain is.
    fn visit(&mut self, root: usize) {
        let edges = self.edges;
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        self.open(root);

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if let Some(&w) = edges[v].get(frame.1) {
                frame.1 += 1;
                if !self.active[w] {
                    continue;
                }
                match self.indices[w] {
                    None => {
                        self.open(w);
                        frames.push((w, 0));
                    }
                    Some(index) if self.on_stack[w] => {
                        self.lowlink[v] = self.lowlink[v].min(index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[v]);
            }

            if self.indices[v] == Some(self.lowlink[v]) {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }

    fn open(&mut self, v: usize) {
        self.indices[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, requires: &[&str]) -> ProviderMetadata {
        ProviderMetadata::new(name).with_requires(requires.iter().copied())
    }

    fn cycle_of(result: Result<BootOrder, CoreError>) -> Vec<String> {
        match result {
            Err(CoreError::CyclicDependency { members }) => members,
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_dependency_precedes_dependent() {
        let providers = vec![provider("Y", &["X"]), provider("X", &[])];
        let order = boot_order(&providers).unwrap();
        assert_eq!(order.names(), vec!["X", "Y"]);
    }

    #[test]
    fn test_order_breaks_ties_then_discovery_index() {
        let providers = vec![
            provider("logger", &[]).with_order(10),
            provider("config", &[]).with_order(-10),
            provider("url", &[]),
            provider("session", &[]),
        ];
        let order = boot_order(&providers).unwrap();
        assert_eq!(order.names(), vec!["config", "url", "session", "logger"]);
    }

    #[test]
    fn test_order_never_overrides_an_edge() {
        // "early" has the lowest order but depends on "late".
        let providers = vec![
            provider("early", &["late"]).with_order(-100),
            provider("late", &[]).with_order(100),
            provider("middle", &[]),
        ];
        let order = boot_order(&providers).unwrap();
        assert_eq!(order.names(), vec!["middle", "late", "early"]);
    }

    #[test]
    fn test_newly_eligible_provider_competes_on_order() {
        // Once "base" is placed, "fast" (order -1) beats "plain" (order 0)
        // even though "plain" was eligible earlier.
        let providers = vec![
            provider("base", &[]).with_order(-5),
            provider("plain", &[]),
            provider("fast", &["base"]).with_order(-1),
        ];
        let order = boot_order(&providers).unwrap();
        assert_eq!(order.names(), vec!["base", "fast", "plain"]);
    }

    #[test]
    fn test_diamond() {
        let providers = vec![
            provider("app", &["db", "cache"]),
            provider("cache", &["config"]),
            provider("db", &["config"]),
            provider("config", &[]),
        ];
        let order = boot_order(&providers).unwrap();
        assert_eq!(order.names(), vec!["config", "cache", "db", "app"]);

        for p in &providers {
            for dep in &p.requires {
                assert!(order.position(dep) < order.position(&p.name));
            }
        }
    }

    #[test]
    fn test_two_node_cycle() {
        let providers = vec![provider("a", &["b"]), provider("b", &["a"])];
        assert_eq!(cycle_of(boot_order(&providers)), vec!["a", "b"]);
    }

    #[test]
    fn test_self_cycle() {
        let providers = vec![provider("ok", &[]), provider("loop", &["loop"])];
        assert_eq!(cycle_of(boot_order(&providers)), vec!["loop"]);
    }

    #[test]
    fn test_cycle_report_excludes_downstream_providers() {
        // c -> b -> a -> c is the cycle; d merely depends on it.
        let providers = vec![
            provider("d", &["a"]),
            provider("a", &["c"]),
            provider("b", &["a"]),
            provider("c", &["b"]),
            provider("free", &[]),
        ];
        assert_eq!(cycle_of(boot_order(&providers)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_all_disjoint_cycles_are_reported() {
        let providers = vec![
            provider("a", &["b"]),
            provider("b", &["a"]),
            provider("x", &["y"]),
            provider("y", &["z"]),
            provider("z", &["x"]),
        ];
        assert_eq!(
            cycle_of(boot_order(&providers)),
            vec!["a", "b", "x", "y", "z"]
        );
    }

    #[test]
    fn test_long_cycle_chain_is_reported_in_full() {
        let count = 50_000;
        let names: Vec<String> = (0..count).map(|i| format!("p{i}")).collect();
        let providers: Vec<ProviderMetadata> = (0..count)
            .map(|i| {
                let previous = &names[(i + count - 1) % count];
                ProviderMetadata::new(names[i].clone()).with_requires([previous.clone()])
            })
            .collect();

        let members = cycle_of(boot_order(&providers));
        assert_eq!(members.len(), count);
        assert_eq!(members.first().map(String::as_str), Some("p0"));
        assert_eq!(members.last().map(String::as_str), Some("p49999"));
    }

    #[test]
    fn test_unresolved_dependency() {
        let providers = vec![provider("Z", &["W"])];
        match boot_order(&providers) {
            Err(CoreError::UnresolvedDependency {
                provider,
                dependency,
                gated_out,
            }) => {
                assert_eq!(provider, "Z");
                assert_eq!(dependency, "W");
                assert!(!gated_out);
            }
            other => panic!("expected UnresolvedDependency, got {other:?}"),
        }

        let err = ProviderGraph::build(&providers, &["W".to_string()]).unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedDependency { gated_out: true, .. }));
    }

    #[test]
    fn test_duplicate_provider_names() {
        let providers = vec![provider("a", &[]), provider("a", &[])];
        assert!(matches!(
            boot_order(&providers),
            Err(CoreError::DuplicateProvider { ref name }) if name == "a"
        ));
    }

    #[test]
    fn test_empty_set() {
        assert!(boot_order(&[]).unwrap().is_empty());
    }
}

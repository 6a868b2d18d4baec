//! Call graph construction over in-scope callable units.
//!
//! Forward adjacency is `caller -> set of callees`, reverse is its exact
//! transpose, built once after every document has been processed. Edge sets
//! are sets, not multisets: repeated call sites between the same pair of
//! units collapse to one edge.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::domain::canonical::canonical_target;
use crate::domain::scope::ScopeFilter;
use crate::domain::unit::{CallableUnit, UnitId};
use crate::ports::{DocumentRef, SemanticResolver};

/// Deterministic ordering used everywhere units are listed: display name
/// first, then declaring scope, file, and position to break ties.
pub fn display_order(a: &CallableUnit, b: &CallableUnit) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.scope_name().cmp(&b.scope_name()))
        .then_with(|| a.file.cmp(&b.file))
        .then_with(|| a.span.start_line.cmp(&b.span.start_line))
        .then_with(|| a.id.cmp(&b.id))
}

/// Forward and reverse call adjacency plus the registered in-scope units.
#[derive(Debug, Default)]
pub struct CallGraph {
    units: BTreeMap<UnitId, CallableUnit>,
    forward: BTreeMap<UnitId, BTreeSet<UnitId>>,
    reverse: BTreeMap<UnitId, BTreeSet<UnitId>>,
}

impl CallGraph {
    /// Register a unit. The first registration for an identity wins; a
    /// duplicate is ignored and reported as `false`.
    pub fn register(&mut self, unit: CallableUnit) -> bool {
        match self.units.entry(unit.id) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(unit);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Insert a forward edge. Both endpoints must already be registered;
    /// edges to unknown units are dropped rather than stored dangling.
    pub fn add_edge(&mut self, from: UnitId, to: UnitId) -> bool {
        if !self.units.contains_key(&from) || !self.units.contains_key(&to) {
            return false;
        }
        self.forward.entry(from).or_default().insert(to)
    }

    /// Rebuild the reverse adjacency as the exact transpose of forward.
    /// Called once, after all edges are inserted.
    pub fn finalize(&mut self) {
        self.reverse.clear();
        for (caller, callees) in &self.forward {
            for callee in callees {
                self.reverse.entry(*callee).or_default().insert(*caller);
            }
        }
    }

    pub fn unit(&self, id: UnitId) -> Option<&CallableUnit> {
        self.units.get(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &CallableUnit> {
        self.units.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(|s| s.len()).sum()
    }

    /// Units this unit calls, in display order.
    pub fn calls_from(&self, id: UnitId) -> Vec<&CallableUnit> {
        self.neighbors(&self.forward, id)
    }

    /// Units calling this unit, in display order.
    pub fn calls_to(&self, id: UnitId) -> Vec<&CallableUnit> {
        self.neighbors(&self.reverse, id)
    }

    fn neighbors(
        &self,
        map: &BTreeMap<UnitId, BTreeSet<UnitId>>,
        id: UnitId,
    ) -> Vec<&CallableUnit> {
        let mut out: Vec<&CallableUnit> = map
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|other| self.units.get(other))
            .collect();
        out.sort_by(|a, b| display_order(a, b));
        out
    }

    /// Distinct files declaring at least one registered unit, sorted.
    pub fn files(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.units.values().map(|u| u.file.as_str()).collect();
        set.into_iter().collect()
    }

    /// Units declared in one file, in display order.
    pub fn units_in_file(&self, file: &str) -> Vec<&CallableUnit> {
        let mut out: Vec<&CallableUnit> =
            self.units.values().filter(|u| u.file == file).collect();
        out.sort_by(|a, b| display_order(a, b));
        out
    }
}

/// Drives one generation run's graph construction against a resolver.
///
/// Documents are harvested in parallel; each harvest only reads from the
/// resolver and collects into its own vectors, and the merge into the shared
/// graph happens single-threaded afterwards.
pub struct GraphBuilder<'a> {
    resolver: &'a dyn SemanticResolver,
    scope: &'a ScopeFilter,
}

struct Harvest {
    units: Vec<CallableUnit>,
    edges: Vec<(UnitId, UnitId)>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: &'a dyn SemanticResolver, scope: &'a ScopeFilter) -> Self {
        GraphBuilder { resolver, scope }
    }

    pub fn build(&self) -> CallGraph {
        let documents: Vec<DocumentRef> = self
            .resolver
            .projects()
            .iter()
            .flat_map(|project| self.resolver.documents(project))
            .collect();

        let harvests: Vec<Harvest> = documents
            .par_iter()
            .map(|doc| self.harvest_document(doc))
            .collect();

        let mut graph = CallGraph::default();
        let mut edges = Vec::new();
        for harvest in harvests {
            for unit in harvest.units {
                graph.register(unit);
            }
            edges.extend(harvest.edges);
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph.finalize();
        graph
    }

    /// Collect the in-scope units of one document and their outgoing edges.
    /// A declaration or call site the resolver cannot bind contributes
    /// nothing and does not abort the rest of the document.
    fn harvest_document(&self, doc: &DocumentRef) -> Harvest {
        let mut units = Vec::new();
        let mut edges = Vec::new();

        for unit in self.resolver.declared_units(doc) {
            if !self.scope.in_scope(&unit) {
                continue;
            }
            let caller = unit.id;
            for site in self.resolver.call_sites(caller) {
                let resolution = self.resolver.resolve_call(&site);
                let Some(target) = canonical_target(&resolution) else {
                    continue;
                };
                if self.scope.in_scope(target) {
                    edges.push((caller, target.id));
                }
            }
            units.push(unit);
        }

        Harvest { units, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::{SourceSpan, UnitKind};

    fn unit(raw: u32, name: &str, file: &str) -> CallableUnit {
        CallableUnit {
            id: UnitId::from_raw(raw),
            name: name.to_string(),
            parent: None,
            file: file.to_string(),
            span: SourceSpan {
                start_line: raw,
                end_line: raw,
            },
            kind: UnitKind::Function,
            krate: "app".to_string(),
            from_source: true,
            is_implicit: false,
            signature: format!("fn {}()", name),
        }
    }

    fn graph_abc() -> CallGraph {
        let mut g = CallGraph::default();
        g.register(unit(1, "alpha", "src/a.rs"));
        g.register(unit(2, "beta", "src/b.rs"));
        g.register(unit(3, "gamma", "src/b.rs"));
        g.add_edge(UnitId::from_raw(1), UnitId::from_raw(2));
        g.add_edge(UnitId::from_raw(1), UnitId::from_raw(3));
        g.add_edge(UnitId::from_raw(2), UnitId::from_raw(3));
        g.finalize();
        g
    }

    #[test]
    fn test_first_registration_wins() {
        let mut g = CallGraph::default();
        assert!(g.register(unit(1, "first", "src/a.rs")));
        assert!(!g.register(unit(1, "second", "src/a.rs")));
        assert_eq!(
            g.unit(UnitId::from_raw(1)).map(|u| u.name.as_str()),
            Some("first")
        );
        assert_eq!(g.unit_count(), 1);
    }

    #[test]
    fn test_edges_require_registered_endpoints() {
        let mut g = CallGraph::default();
        g.register(unit(1, "alpha", "src/a.rs"));
        assert!(!g.add_edge(UnitId::from_raw(1), UnitId::from_raw(9)));
        assert!(!g.add_edge(UnitId::from_raw(9), UnitId::from_raw(1)));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_repeated_call_sites_collapse_to_one_edge() {
        let mut g = CallGraph::default();
        g.register(unit(1, "alpha", "src/a.rs"));
        g.register(unit(2, "beta", "src/b.rs"));
        assert!(g.add_edge(UnitId::from_raw(1), UnitId::from_raw(2)));
        assert!(!g.add_edge(UnitId::from_raw(1), UnitId::from_raw(2)));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_reverse_is_exact_transpose() {
        let g = graph_abc();
        for caller in g.units() {
            for callee in g.calls_from(caller.id) {
                assert!(
                    g.calls_to(callee.id).iter().any(|u| u.id == caller.id),
                    "forward edge {}->{} missing from reverse",
                    caller.name,
                    callee.name
                );
            }
        }
        for callee in g.units() {
            for caller in g.calls_to(callee.id) {
                assert!(
                    g.calls_from(caller.id).iter().any(|u| u.id == callee.id),
                    "reverse edge {}<-{} missing from forward",
                    callee.name,
                    caller.name
                );
            }
        }
        let reverse_total: usize = g.units().map(|u| g.calls_to(u.id).len()).sum();
        assert_eq!(reverse_total, g.edge_count());
    }

    #[test]
    fn test_neighbor_lists_sorted_by_display_name() {
        let mut g = CallGraph::default();
        g.register(unit(1, "caller", "src/a.rs"));
        g.register(unit(2, "zeta", "src/b.rs"));
        g.register(unit(3, "ada", "src/b.rs"));
        g.add_edge(UnitId::from_raw(1), UnitId::from_raw(2));
        g.add_edge(UnitId::from_raw(1), UnitId::from_raw(3));
        g.finalize();
        let names: Vec<&str> = g
            .calls_from(UnitId::from_raw(1))
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, vec!["ada", "zeta"]);
    }

    #[test]
    fn test_units_in_file_sorted() {
        let g = graph_abc();
        let names: Vec<&str> = g
            .units_in_file("src/b.rs")
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, vec!["beta", "gamma"]);
        assert_eq!(g.files(), vec!["src/a.rs", "src/b.rs"]);
    }

    #[test]
    fn test_self_edges_are_kept() {
        let mut g = CallGraph::default();
        g.register(unit(1, "looper", "src/a.rs"));
        assert!(g.add_edge(UnitId::from_raw(1), UnitId::from_raw(1)));
        g.finalize();
        assert_eq!(g.calls_from(UnitId::from_raw(1)).len(), 1);
        assert_eq!(g.calls_to(UnitId::from_raw(1)).len(), 1);
    }
}

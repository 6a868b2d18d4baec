//! Resolver over pre-resolved facts held in memory.
//!
//! The SCIP loader materializes one of these from an index file; tests
//! assemble them directly. Call sites carry pre-bound resolutions keyed by
//! (caller, ordinal), so `resolve_call` is a lookup, never an analysis.

use std::collections::BTreeMap;

use crate::domain::canonical::Resolution;
use crate::domain::unit::{CallableUnit, UnitId};
use crate::ports::{CallSite, DocumentRef, ProjectRef, SemanticResolver};

#[derive(Debug, Default)]
pub struct MemoryResolver {
    projects: Vec<String>,
    documents: BTreeMap<String, Vec<String>>,
    units: BTreeMap<UnitId, CallableUnit>,
    units_by_document: BTreeMap<String, Vec<UnitId>>,
    call_sites: BTreeMap<UnitId, Vec<CallSite>>,
    resolutions: BTreeMap<(UnitId, u32), Resolution>,
    docs: BTreeMap<UnitId, String>,
    next_id: u32,
}

impl MemoryResolver {
    pub fn mint_id(&mut self) -> UnitId {
        self.next_id += 1;
        UnitId::from_raw(self.next_id)
    }

    pub fn add_project(&mut self, name: &str) {
        if !self.projects.iter().any(|p| p == name) {
            self.projects.push(name.to_string());
        }
        self.documents.entry(name.to_string()).or_default();
    }

    /// Register a unit under its crate and file. Document lists keep
    /// registration order.
    pub fn add_unit(&mut self, unit: CallableUnit) {
        self.add_project(&unit.krate);
        let docs = self.documents.entry(unit.krate.clone()).or_default();
        if !docs.contains(&unit.file) {
            docs.push(unit.file.clone());
        }
        self.units_by_document
            .entry(unit.file.clone())
            .or_default()
            .push(unit.id);
        self.units.insert(unit.id, unit);
    }

    /// Append a call site to `caller`'s body with its pre-bound resolution.
    /// Ordinals are minted in append order.
    pub fn add_call(&mut self, caller: UnitId, callee: &str, resolution: Resolution) {
        let sites = self.call_sites.entry(caller).or_default();
        let ordinal = sites.len() as u32;
        sites.push(CallSite {
            caller,
            ordinal,
            callee: callee.to_string(),
            qualifier: None,
            is_method: false,
        });
        self.resolutions.insert((caller, ordinal), resolution);
    }

    pub fn set_documentation(&mut self, unit: UnitId, text: &str) {
        self.docs.insert(unit, text.to_string());
    }

    pub fn unit(&self, id: UnitId) -> Option<&CallableUnit> {
        self.units.get(&id)
    }
}

impl SemanticResolver for MemoryResolver {
    fn projects(&self) -> Vec<ProjectRef> {
        self.projects
            .iter()
            .map(|name| ProjectRef { name: name.clone() })
            .collect()
    }

    fn documents(&self, project: &ProjectRef) -> Vec<DocumentRef> {
        self.documents
            .get(&project.name)
            .map(|paths| {
                paths
                    .iter()
                    .map(|path| DocumentRef {
                        project: project.name.clone(),
                        path: path.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn declared_units(&self, document: &DocumentRef) -> Vec<CallableUnit> {
        self.units_by_document
            .get(&document.path)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.units.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn call_sites(&self, unit: UnitId) -> Vec<CallSite> {
        self.call_sites.get(&unit).cloned().unwrap_or_default()
    }

    fn resolve_call(&self, site: &CallSite) -> Resolution {
        self.resolutions
            .get(&(site.caller, site.ordinal))
            .cloned()
            .unwrap_or(Resolution::Unresolved)
    }

    fn raw_documentation(&self, unit: UnitId) -> Option<String> {
        self.docs.get(&unit).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::{SourceSpan, UnitKind};

    fn unit(id: UnitId, name: &str, krate: &str, file: &str) -> CallableUnit {
        CallableUnit {
            id,
            name: name.to_string(),
            parent: None,
            file: file.to_string(),
            span: SourceSpan::default(),
            kind: UnitKind::Function,
            krate: krate.to_string(),
            from_source: true,
            is_implicit: false,
            signature: format!("fn {}()", name),
        }
    }

    #[test]
    fn test_projects_and_documents_keep_registration_order() {
        let mut r = MemoryResolver::default();
        let a = r.mint_id();
        let b = r.mint_id();
        r.add_unit(unit(a, "foo", "zeta", "src/z.rs"));
        r.add_unit(unit(b, "bar", "alpha", "src/a.rs"));

        let projects = r.projects();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "zeta");
        assert_eq!(projects[1].name, "alpha");

        let docs = r.documents(&projects[0]);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "src/z.rs");
    }

    #[test]
    fn test_resolutions_bind_by_caller_and_ordinal() {
        let mut r = MemoryResolver::default();
        let caller = r.mint_id();
        let callee = r.mint_id();
        r.add_unit(unit(caller, "foo", "app", "src/a.rs"));
        r.add_unit(unit(callee, "bar", "app", "src/b.rs"));
        r.add_call(
            caller,
            "bar",
            Resolution::Direct(unit(callee, "bar", "app", "src/b.rs")),
        );
        r.add_call(caller, "mystery", Resolution::Unresolved);

        let sites = r.call_sites(caller);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].ordinal, 0);
        assert_eq!(sites[1].ordinal, 1);

        match r.resolve_call(&sites[0]) {
            Resolution::Direct(u) => assert_eq!(u.id, callee),
            other => panic!("expected direct resolution, got {:?}", other),
        }
        assert!(matches!(r.resolve_call(&sites[1]), Resolution::Unresolved));
    }

    #[test]
    fn test_documentation_payloads_round_trip() {
        let mut r = MemoryResolver::default();
        let id = r.mint_id();
        r.add_unit(unit(id, "foo", "app", "src/a.rs"));
        assert!(r.raw_documentation(id).is_none());
        r.set_documentation(id, "Does things.");
        assert_eq!(r.raw_documentation(id).as_deref(), Some("Does things."));
    }
}

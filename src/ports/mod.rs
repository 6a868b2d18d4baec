// Ports: the resolver seam the engine is built against, plus rendering,
// naming, and export of the finished graph.

use crate::domain::canonical::Resolution;
use crate::domain::unit::{CallableUnit, UnitId};

pub mod graph_export;
pub mod note_renderer;
pub mod note_writer;

/// One analyzed project (a workspace member crate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub name: String,
}

/// One source document belonging to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub project: String,
    /// Workspace-relative path.
    pub path: String,
}

/// One call expression inside a unit's body, as surfaced by a resolver.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub caller: UnitId,
    /// Position of the expression within the caller's body.
    pub ordinal: u32,
    /// Bare called identifier.
    pub callee: String,
    /// Leading path segment or receiver type, when the resolver knows one.
    pub qualifier: Option<String>,
    /// Receiver call syntax (`x.f()`) rather than path syntax (`f()`).
    pub is_method: bool,
}

/// Semantic analysis seam. Implementations own declaration discovery, call
/// resolution, and documentation payloads; the graph builder consumes this
/// interface and nothing else. Failures degenerate to empty lists or
/// `Resolution::Unresolved`, never to errors mid-run.
pub trait SemanticResolver: Send + Sync {
    /// Analyzed projects, in deterministic order.
    fn projects(&self) -> Vec<ProjectRef>;

    /// Source documents of one project, in deterministic order.
    fn documents(&self, project: &ProjectRef) -> Vec<DocumentRef>;

    /// Units declared in one document, in declaration order. A document the
    /// resolver could not analyze yields an empty list.
    fn declared_units(&self, document: &DocumentRef) -> Vec<CallableUnit>;

    /// Call expressions inside one unit's body.
    fn call_sites(&self, unit: UnitId) -> Vec<CallSite>;

    /// Bind one call site to its target declaration(s).
    fn resolve_call(&self, site: &CallSite) -> Resolution;

    /// Raw documentation payload attached to a unit, if any.
    fn raw_documentation(&self, unit: UnitId) -> Option<String>;
}

/// Which note granularity a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMode {
    PerFile,
    PerUnit,
}

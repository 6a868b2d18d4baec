// Callable units and their identities.

use std::path::Path;

/// Opaque identity for one declaration. Handles are minted by the resolver
/// that discovered the declaration; only equality, hashing, and ordering are
/// meaningful to everything downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    pub fn from_raw(raw: u32) -> Self {
        UnitId(raw)
    }

    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

/// What kind of declaration a unit is. Operators and accessors exist so the
/// scope filter can drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Function,
    Method,
    Constructor,
    Operator,
    Accessor,
}

impl UnitKind {
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Function => "function",
            UnitKind::Method => "method",
            UnitKind::Constructor => "constructor",
            UnitKind::Operator => "operator",
            UnitKind::Accessor => "accessor",
        }
    }
}

/// Line range of a declaration within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start_line: u32,
    pub end_line: u32,
}

/// One function/method/constructor/operator declaration, as reported by a
/// semantic resolver. Never mutated after discovery.
#[derive(Debug, Clone)]
pub struct CallableUnit {
    pub id: UnitId,
    /// Bare declared identifier. Deliberately unqualified: cross-reference
    /// links key on this, so same-named units alias to one link target.
    pub name: String,
    /// Declaring type, when the unit is an associated item.
    pub parent: Option<String>,
    /// Workspace-relative path of the declaring file.
    pub file: String,
    pub span: SourceSpan,
    pub kind: UnitKind,
    /// Owning crate.
    pub krate: String,
    /// Backed by on-disk source text, as opposed to metadata-only.
    pub from_source: bool,
    /// Compiler- or derive-generated rather than hand-written.
    pub is_implicit: bool,
    /// One-line rendering of the declaration signature.
    pub signature: String,
}

impl CallableUnit {
    /// Declaring scope used for per-unit note naming: the declaring type when
    /// there is one, otherwise the base name of the declaring file.
    pub fn scope_name(&self) -> String {
        match &self.parent {
            Some(parent) => parent.clone(),
            None => Path::new(&self.file)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.file.clone()),
        }
    }
}

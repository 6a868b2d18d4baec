// Project scope filtering: which units are "ours" and worth documenting.

use std::collections::HashSet;

use crate::domain::unit::{CallableUnit, UnitKind};

/// Pure predicate deciding whether a unit belongs to the analyzed project's
/// own documentable surface. Applied to callers and call targets alike, so
/// edges touching out-of-scope units are silently omitted.
pub struct ScopeFilter {
    members: HashSet<String>,
}

impl ScopeFilter {
    /// `members` are the crate names of the loaded workspace. Names are
    /// normalized the way cargo normalizes target names (`-` becomes `_`),
    /// since resolvers may report either spelling.
    pub fn new(members: impl IntoIterator<Item = String>) -> Self {
        ScopeFilter {
            members: members
                .into_iter()
                .map(|m| m.replace('-', "_"))
                .collect(),
        }
    }

    /// A unit is in scope iff it belongs to a workspace member crate, is
    /// backed by real source text, is not compiler-generated, and is not
    /// operator or accessor noise.
    pub fn in_scope(&self, unit: &CallableUnit) -> bool {
        self.members.contains(&unit.krate.replace('-', "_"))
            && unit.from_source
            && !unit.is_implicit
            && !matches!(unit.kind, UnitKind::Operator | UnitKind::Accessor)
    }
}

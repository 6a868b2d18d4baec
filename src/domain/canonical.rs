// Canonical identity for resolved call targets.

use crate::domain::unit::CallableUnit;

/// Outcome of resolving one call expression. Resolvers report the richest
/// form they know; `canonical_target` reduces every form to at most one unit.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The call binds to exactly one declaration.
    Direct(CallableUnit),
    /// The call binds to a reduced/bound form of another declaration.
    Reduced {
        bound: CallableUnit,
        original: CallableUnit,
    },
    /// The call binds to a generic instantiation of a definition.
    Instantiated {
        instance: CallableUnit,
        definition: CallableUnit,
    },
    /// The resolver found several plausible targets and no single winner.
    /// Candidates arrive in a deterministic order.
    Ambiguous(Vec<CallableUnit>),
    /// No target could be bound.
    Unresolved,
}

/// Map a resolution to the one unit an edge should point at.
///
/// Reduced forms collapse to their unbound original and instantiations to
/// their unspecialized definition, so identity comparison stays exact
/// equality rather than structural matching. An ambiguous resolution picks
/// the first candidate: one edge, deterministically chosen, which
/// approximates a genuinely multi-valued fact rather than fanning out.
pub fn canonical_target(resolution: &Resolution) -> Option<&CallableUnit> {
    match resolution {
        Resolution::Direct(unit) => Some(unit),
        Resolution::Reduced { original, .. } => Some(original),
        Resolution::Instantiated { definition, .. } => Some(definition),
        Resolution::Ambiguous(candidates) => candidates.first(),
        Resolution::Unresolved => None,
    }
}

// Domain model: callable units, canonical identity, scope, the call graph,
// and documentation blocks.

pub mod callgraph;
pub mod canonical;
pub mod docs;
pub mod scope;
pub mod unit;

// Infrastructure implementations for callvault.

pub mod concurrency;
pub mod memory_resolver;
pub mod project_loader;
pub mod scip_resolver;
pub mod syn_resolver;

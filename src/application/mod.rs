//! Application layer: one note-generation run end to end.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::callgraph::{CallGraph, GraphBuilder};
use crate::domain::scope::ScopeFilter;
use crate::domain::unit::UnitId;
use crate::ports::graph_export;
use crate::ports::note_renderer::{render_file_notes, render_unit_notes};
use crate::ports::note_writer::NoteWriter;
use crate::ports::{NoteMode, SemanticResolver};

/// Outcome counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub edges: usize,
    pub notes: usize,
}

/// Wires a resolver, the scope filter, and the renderers together.
pub struct GenerateUsecase<'a> {
    pub resolver: &'a dyn SemanticResolver,
    pub scope: &'a ScopeFilter,
    pub mode: NoteMode,
    pub graph_json: Option<PathBuf>,
}

impl<'a> GenerateUsecase<'a> {
    /// Build the graph, render notes in the selected mode, and persist
    /// everything under `out_dir`.
    pub fn run(&self, out_dir: &Path) -> Result<RunSummary> {
        let graph = GraphBuilder::new(self.resolver, self.scope).build();
        let docs = self.collect_docs(&graph);

        let notes = match self.mode {
            NoteMode::PerFile => render_file_notes(&graph, &docs),
            NoteMode::PerUnit => render_unit_notes(&graph, &docs),
        };
        let written = NoteWriter::write_all(out_dir, &notes)?;

        if let Some(path) = &self.graph_json {
            graph_export::export_json(&graph, path)?;
        }

        Ok(RunSummary {
            units: graph.unit_count(),
            edges: graph.edge_count(),
            notes: written,
        })
    }

    fn collect_docs(&self, graph: &CallGraph) -> BTreeMap<UnitId, String> {
        graph
            .units()
            .filter_map(|unit| {
                self.resolver
                    .raw_documentation(unit.id)
                    .map(|raw| (unit.id, raw))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::domain::canonical::Resolution;
    use crate::domain::unit::{CallableUnit, SourceSpan, UnitKind};
    use crate::infrastructure::memory_resolver::MemoryResolver;

    fn unit(id: UnitId, name: &str, file: &str) -> CallableUnit {
        CallableUnit {
            id,
            name: name.to_string(),
            parent: None,
            file: file.to_string(),
            span: SourceSpan {
                start_line: 1,
                end_line: 2,
            },
            kind: UnitKind::Function,
            krate: "alpha".to_string(),
            from_source: true,
            is_implicit: false,
            signature: format!("fn {}()", name),
        }
    }

    fn sample_resolver() -> MemoryResolver {
        let mut r = MemoryResolver::default();
        let foo = r.mint_id();
        let bar = r.mint_id();
        r.add_unit(unit(foo, "foo", "alpha/src/a.rs"));
        r.add_unit(unit(bar, "bar", "alpha/src/b.rs"));
        r.add_call(foo, "bar", Resolution::Direct(unit(bar, "bar", "alpha/src/b.rs")));
        r.set_documentation(foo, "Entry point of the pipeline.");
        r
    }

    #[test]
    fn test_per_file_run_writes_notes() {
        let resolver = sample_resolver();
        let scope = ScopeFilter::new(vec!["alpha".to_string()]);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("notes");

        let usecase = GenerateUsecase {
            resolver: &resolver,
            scope: &scope,
            mode: NoteMode::PerFile,
            graph_json: None,
        };
        let summary = usecase.run(&out).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                units: 2,
                edges: 1,
                notes: 2
            }
        );
        let a = fs::read_to_string(out.join("a.md")).unwrap();
        assert!(a.contains("Entry point of the pipeline."));
        assert!(a.contains("- [[bar]]"));
        assert!(out.join("b.md").is_file());
    }

    #[test]
    fn test_per_unit_run_with_graph_export() {
        let resolver = sample_resolver();
        let scope = ScopeFilter::new(vec!["alpha".to_string()]);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("notes");
        let json = dir.path().join("graph.json");

        let usecase = GenerateUsecase {
            resolver: &resolver,
            scope: &scope,
            mode: NoteMode::PerUnit,
            graph_json: Some(json.clone()),
        };
        let summary = usecase.run(&out).unwrap();

        assert_eq!(summary.notes, 2);
        assert!(out.join("a.foo.md").is_file());
        assert!(out.join("b.bar.md").is_file());

        let exported: graph_export::GraphDto =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(exported.units.len(), 2);
        assert_eq!(exported.edges.len(), 1);
    }
}

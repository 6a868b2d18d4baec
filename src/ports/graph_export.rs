//! JSON export of the call graph for downstream tooling.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::callgraph::CallGraph;

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub units: Vec<UnitDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnitDto {
    pub id: u32,
    pub name: String,
    pub scope: String,
    pub file: String,
    pub kind: String,
    pub krate: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub caller: u32,
    pub callee: u32,
}

impl From<&CallGraph> for GraphDto {
    fn from(graph: &CallGraph) -> Self {
        let units = graph
            .units()
            .map(|u| UnitDto {
                id: u.id.as_raw(),
                name: u.name.clone(),
                scope: u.scope_name(),
                file: u.file.clone(),
                kind: u.kind.label().to_string(),
                krate: u.krate.clone(),
                start_line: u.span.start_line,
                end_line: u.span.end_line,
            })
            .collect();

        let mut edges = Vec::new();
        for unit in graph.units() {
            for callee in graph.calls_from(unit.id) {
                edges.push(EdgeDto {
                    caller: unit.id.as_raw(),
                    callee: callee.id.as_raw(),
                });
            }
        }

        GraphDto { units, edges }
    }
}

/// Serialize the graph to pretty-printed JSON at `path`.
pub fn export_json(graph: &CallGraph, path: &Path) -> Result<()> {
    let dto = GraphDto::from(graph);
    let json = serde_json::to_string_pretty(&dto).context("failed to serialize call graph")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write graph JSON to {}", path.display()))?;
    Ok(())
}

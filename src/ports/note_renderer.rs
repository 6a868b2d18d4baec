//! Markdown note rendering.
//!
//! A section documents one unit. Per-file notes concatenate the sections of
//! every in-scope unit declared in a file; per-unit notes hold one section
//! with a context header. All ordering is lexicographic by display name, so
//! the same graph always renders to byte-identical notes. Cross-reference
//! links key on the bare display name: same-named units share a link target,
//! which is the intended behavior of this format, not a defect.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::callgraph::{display_order, CallGraph};
use crate::domain::docs::DocBlock;
use crate::domain::unit::{CallableUnit, UnitId};
use crate::ports::note_writer::{file_note_name, unit_note_name};

/// Marker emitted when a unit carries no documentation, distinguishable so
/// it can be backfilled later.
pub const DOC_PLACEHOLDER: &str = "_Not yet documented._";

/// Body of the reserved improvement-notes sub-section.
pub const IMPROVEMENTS_PLACEHOLDER: &str = "_None recorded._";

/// One output document, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNote {
    pub file_name: String,
    pub content: String,
}

/// Render the section for one unit: heading, documentation (or placeholder),
/// the reserved improvement-notes sub-section, the declaration signature,
/// then calls and called-by lists, each omitted entirely when empty.
pub fn render_section(unit: &CallableUnit, graph: &CallGraph, block: &DocBlock) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("## {}", unit.name));
    lines.push(String::new());
    lines.push("### Documentation".to_string());
    lines.push(String::new());
    lines.extend(doc_lines(block));
    lines.push(String::new());
    lines.push("### Improvement notes".to_string());
    lines.push(String::new());
    lines.push(IMPROVEMENTS_PLACEHOLDER.to_string());
    lines.push(String::new());
    lines.push("### Signature".to_string());
    lines.push(String::new());
    lines.push("```rust".to_string());
    lines.push(unit.signature.clone());
    lines.push("```".to_string());

    let callees = link_list(graph.calls_from(unit.id));
    if !callees.is_empty() {
        lines.push(String::new());
        lines.push("### Calls".to_string());
        lines.push(String::new());
        lines.extend(callees);
    }

    let callers = link_list(graph.calls_to(unit.id));
    if !callers.is_empty() {
        lines.push(String::new());
        lines.push("### Called by".to_string());
        lines.push(String::new());
        lines.extend(callers);
    }

    lines
}

fn doc_lines(block: &DocBlock) -> Vec<String> {
    if block.is_empty() {
        return vec![DOC_PLACEHOLDER.to_string()];
    }

    let mut out = Vec::new();
    if let Some(summary) = &block.summary {
        out.push(summary.clone());
    }
    if !block.params.is_empty() {
        if !out.is_empty() {
            out.push(String::new());
        }
        out.push("**Parameters:**".to_string());
        out.push(String::new());
        for (name, desc) in &block.params {
            if desc.is_empty() {
                out.push(format!("- `{}`", name));
            } else {
                out.push(format!("- `{}`: {}", name, desc));
            }
        }
    }
    if let Some(returns) = &block.returns {
        if !out.is_empty() {
            out.push(String::new());
        }
        out.push(format!("**Returns:** {}", returns));
    }
    if let Some(remarks) = &block.remarks {
        if !out.is_empty() {
            out.push(String::new());
        }
        out.push(format!("**Remarks:** {}", remarks));
    }
    out
}

/// Link bullets for an already display-ordered unit list. Names repeat when
/// distinct units alias to one display name; the repeated link collapses.
fn link_list(units: Vec<&CallableUnit>) -> Vec<String> {
    let mut names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    names.dedup();
    names.into_iter().map(|n| format!("- [[{}]]", n)).collect()
}

fn doc_block_for(unit: &CallableUnit, docs: &BTreeMap<UnitId, String>) -> DocBlock {
    DocBlock::extract(docs.get(&unit.id).map(|s| s.as_str()))
}

/// One note per source file declaring at least one in-scope unit.
pub fn render_file_notes(
    graph: &CallGraph,
    docs: &BTreeMap<UnitId, String>,
) -> Vec<RenderedNote> {
    let mut notes = Vec::new();
    for file in graph.files() {
        let title = Path::new(file)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());

        let mut lines = Vec::new();
        lines.push("---".to_string());
        lines.push("tags: [file]".to_string());
        lines.push(format!("source: {}", file));
        lines.push("---".to_string());
        lines.push(String::new());
        lines.push(format!("# {}", title));

        for unit in graph.units_in_file(file) {
            lines.push(String::new());
            lines.extend(render_section(unit, graph, &doc_block_for(unit, docs)));
        }
        lines.push(String::new());

        notes.push(RenderedNote {
            file_name: file_note_name(file),
            content: lines.join("\n"),
        });
    }
    notes.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    notes
}

/// One note per in-scope unit, with a context header naming the declaring
/// type and source path.
pub fn render_unit_notes(
    graph: &CallGraph,
    docs: &BTreeMap<UnitId, String>,
) -> Vec<RenderedNote> {
    let mut units: Vec<&CallableUnit> = graph.units().collect();
    units.sort_by(|a, b| display_order(a, b));

    let mut notes = Vec::new();
    for unit in units {
        let scope = unit.scope_name();

        let mut lines = Vec::new();
        lines.push("---".to_string());
        lines.push("tags: [method]".to_string());
        lines.push(format!("unit: {}.{}", scope, unit.name));
        lines.push("---".to_string());
        lines.push(String::new());
        lines.push(format!("# {}.{}", scope, unit.name));
        lines.push(String::new());
        if let Some(parent) = &unit.parent {
            lines.push(format!("**Type:** `{}`", parent));
        }
        lines.push(format!("**Source:** `{}`", unit.file));
        lines.push(String::new());
        lines.extend(render_section(unit, graph, &doc_block_for(unit, docs)));
        lines.push(String::new());

        notes.push(RenderedNote {
            file_name: unit_note_name(&scope, &unit.name),
            content: lines.join("\n"),
        });
    }
    notes
}

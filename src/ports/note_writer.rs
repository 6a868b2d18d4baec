//! Note persistence with deterministic file naming.
//!
//! Naming is a pure function of the source path (per-file mode) or of the
//! declaring scope and unit name (per-unit mode), so two notes never race
//! for the same destination within a run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::ports::note_renderer::RenderedNote;

const INVALID: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace filesystem-invalid characters with `_`.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Per-file note name: the source file's base name with a `.md` extension.
pub fn file_note_name(source_path: &str) -> String {
    let stem = Path::new(source_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_path.to_string());
    format!("{}.md", sanitize_component(&stem))
}

/// Per-unit note name: `<DeclaringScope>.<UnitName>.md`.
pub fn unit_note_name(scope: &str, unit: &str) -> String {
    format!(
        "{}.{}.md",
        sanitize_component(scope),
        sanitize_component(unit)
    )
}

pub struct NoteWriter;

impl NoteWriter {
    /// Write every rendered note under `dir`, creating it if needed.
    /// Returns the number of notes written.
    pub fn write_all(dir: &Path, notes: &[RenderedNote]) -> Result<usize> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        for note in notes {
            let path = dir.join(&note.file_name);
            fs::write(&path, &note.content)
                .with_context(|| format!("failed to write note {}", path.display()))?;
        }
        Ok(notes.len())
    }
}

//! SCIP-backed resolver.
//!
//! Loads a `rust-analyzer`-produced SCIP index and materializes a
//! `MemoryResolver` from it: definition occurrences become units, reference
//! occurrences inside a definition's extent become pre-resolved call sites.
//! References to symbols the index never defines stay unresolved. SCIP
//! carries no declaration text, so signatures degrade to `fn <name>`.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;
use protobuf::Message;
use scip::types::{Document, Index};

use crate::domain::canonical::Resolution;
use crate::domain::unit::{CallableUnit, SourceSpan, UnitId, UnitKind};
use crate::infrastructure::memory_resolver::MemoryResolver;

/// Represents a range in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceRange {
    start_line: i32,
    start_col: i32,
    end_line: i32,
    end_col: i32,
}

impl SourceRange {
    fn contains(&self, other: &SourceRange) -> bool {
        if self.start_line > other.start_line || self.end_line < other.end_line {
            return false;
        }
        if self.start_line == other.start_line && self.start_col > other.start_col {
            return false;
        }
        if self.end_line == other.end_line && self.end_col < other.end_col {
            return false;
        }
        true
    }

    fn size_key(&self) -> i64 {
        (self.end_line - self.start_line) as i64 * 1000
            + (self.end_col - self.start_col) as i64
    }
}

/// A definition occurrence with its full extent.
#[derive(Debug, Clone)]
struct DefinitionInfo {
    symbol: String,
    range: SourceRange,
}

/// The pieces of a SCIP symbol needed to mint a unit.
#[derive(Debug, PartialEq)]
struct ParsedSymbol {
    krate: String,
    parent: Option<String>,
    name: String,
}

/// Read and ingest a SCIP index file.
pub fn load_scip_index(path: &Path) -> Result<MemoryResolver> {
    println!("[callvault] Loading SCIP index from: {}", path.display());
    let file = File::open(path)
        .with_context(|| format!("Failed to open SCIP index {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap SCIP index {}", path.display()))?;
    let index = Index::parse_from_bytes(&mmap).context("Failed to parse SCIP index file")?;
    Ok(ingest(&index))
}

fn ingest(index: &Index) -> MemoryResolver {
    let mut resolver = MemoryResolver::default();
    let mut unit_by_symbol: HashMap<String, UnitId> = HashMap::new();
    let mut definitions_by_file: BTreeMap<String, Vec<DefinitionInfo>> = BTreeMap::new();

    // Index files in path order so unit ids depend only on the input.
    let mut documents: Vec<&Document> = index.documents.iter().collect();
    documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    // Pass 1: definition occurrences become units.
    for document in &documents {
        let docs_by_symbol: HashMap<&str, String> = document
            .symbols
            .iter()
            .filter(|info| !info.documentation.is_empty())
            .map(|info| (info.symbol.as_str(), info.documentation.join("\n")))
            .collect();

        let mut file_defs: Vec<DefinitionInfo> = Vec::new();
        for occurrence in &document.occurrences {
            let is_definition = occurrence.symbol_roles & 1 != 0;
            if !is_definition || occurrence.symbol.is_empty() {
                continue;
            }
            let Some(parsed) = parse_symbol(&occurrence.symbol) else {
                continue;
            };
            // Definitions carry the name token in `range`; the full body
            // extent, when the indexer provides it, is `enclosing_range`.
            let extent = if occurrence.enclosing_range.is_empty() {
                &occurrence.range
            } else {
                &occurrence.enclosing_range
            };
            let range = parse_scip_range(extent);

            if !unit_by_symbol.contains_key(&occurrence.symbol) {
                let id = resolver.mint_id();
                if let Some(doc) = docs_by_symbol.get(occurrence.symbol.as_str()) {
                    resolver.set_documentation(id, doc);
                }
                resolver.add_unit(CallableUnit {
                    id,
                    name: parsed.name.clone(),
                    parent: parsed.parent.clone(),
                    file: document.relative_path.clone(),
                    // SCIP lines are 0-based.
                    span: SourceSpan {
                        start_line: (range.start_line + 1).max(0) as u32,
                        end_line: (range.end_line + 1).max(0) as u32,
                    },
                    kind: classify(&parsed),
                    krate: parsed.krate.clone(),
                    from_source: true,
                    is_implicit: false,
                    signature: format!("fn {}", parsed.name),
                });
                unit_by_symbol.insert(occurrence.symbol.clone(), id);
            }

            file_defs.push(DefinitionInfo {
                symbol: occurrence.symbol.clone(),
                range,
            });
        }

        // Smallest extent first, so containment lookup finds the innermost
        // enclosing definition.
        file_defs.sort_by(|a, b| a.range.size_key().cmp(&b.range.size_key()));
        definitions_by_file.insert(document.relative_path.clone(), file_defs);
    }

    // Pass 2: reference occurrences inside a definition become call sites.
    for document in &documents {
        let Some(file_defs) = definitions_by_file.get(&document.relative_path) else {
            continue;
        };
        for occurrence in &document.occurrences {
            let is_definition = occurrence.symbol_roles & 1 != 0;
            if is_definition || occurrence.symbol.is_empty() {
                continue;
            }
            let Some(parsed) = parse_symbol(&occurrence.symbol) else {
                continue;
            };
            let ref_range = parse_scip_range(&occurrence.range);
            let Some(def) = file_defs.iter().find(|def| def.range.contains(&ref_range))
            else {
                continue;
            };
            let Some(&caller) = unit_by_symbol.get(&def.symbol) else {
                continue;
            };

            let resolution = match unit_by_symbol.get(&occurrence.symbol) {
                Some(&callee) => match resolver.unit(callee) {
                    Some(unit) => Resolution::Direct(unit.clone()),
                    None => Resolution::Unresolved,
                },
                None => Resolution::Unresolved,
            };
            resolver.add_call(caller, &parsed.name, resolution);
        }
    }

    resolver
}

fn classify(parsed: &ParsedSymbol) -> UnitKind {
    match &parsed.parent {
        Some(_) if parsed.name == "new" => UnitKind::Constructor,
        Some(_) => UnitKind::Method,
        None => UnitKind::Function,
    }
}

/// Parse a rust-analyzer symbol of the form
/// `rust-analyzer cargo crate_name 0.1.0 module/Type#method().`.
/// Only function-like descriptors (ending in `).`) yield a result.
fn parse_symbol(symbol: &str) -> Option<ParsedSymbol> {
    let parts: Vec<&str> = symbol.splitn(5, ' ').collect();
    if parts.len() < 5 {
        // Locals look like `local 3`.
        return None;
    }
    let krate = parts[2];
    let descriptors = parts[4];
    if !descriptors.ends_with(").") {
        return None;
    }

    let tail = descriptors.rsplit('/').next().unwrap_or(descriptors);
    let (parent, method) = match tail.rsplit_once('#') {
        Some((parent, method)) => {
            (Some(parent.rsplit('#').next().unwrap_or(parent)), method)
        }
        None => (None, tail),
    };
    let name = method.split('(').next().unwrap_or(method);
    if name.is_empty() {
        return None;
    }
    Some(ParsedSymbol {
        krate: krate.to_string(),
        parent: parent.map(str::to_string),
        name: name.to_string(),
    })
}

/// Parse SCIP range format: [start_line, start_col, end_line, end_col] or
/// [start_line, start_col, end_col].
fn parse_scip_range(range: &[i32]) -> SourceRange {
    match range.len() {
        3 => SourceRange {
            start_line: range[0],
            start_col: range[1],
            end_line: range[0], // Same line
            end_col: range[2],
        },
        4 => SourceRange {
            start_line: range[0],
            start_col: range[1],
            end_line: range[2],
            end_col: range[3],
        },
        _ => SourceRange {
            start_line: 0,
            start_col: 0,
            end_line: 0,
            end_col: 0,
        },
    }
}

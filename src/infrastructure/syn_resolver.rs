//! Syntax-level resolver built on `syn`.
//!
//! Files parse in parallel into per-file harvests; identity minting and
//! index insertion then run single-threaded over the harvests in sorted
//! path order, so unit ids depend only on the input, not on scheduling.
//! Resolution is name-based and conservative: a call that matches several
//! declarations reports all of them as an ambiguity, and one that matches
//! none stays unresolved. Calls spelled inside macro invocations are not
//! visible at this level.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use dashmap::DashMap;
use proc_macro2::LineColumn;
use rayon::prelude::*;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{
    Attribute, Block, Expr, ExprCall, ExprMethodCall, FnArg, ImplItem, Item, ItemImpl, Lit,
    Meta, Signature, Stmt, TraitItem, Type, Visibility,
};

use crate::domain::canonical::Resolution;
use crate::domain::docs::collapse_ws;
use crate::domain::unit::{CallableUnit, SourceSpan, UnitId, UnitKind};
use crate::infrastructure::project_loader::LoadedWorkspace;
use crate::ports::{CallSite, DocumentRef, ProjectRef, SemanticResolver};

/// Trait names whose impl methods count as operator declarations.
const OPERATOR_TRAITS: &[&str] = &[
    "Add", "Sub", "Mul", "Div", "Rem", "Neg", "Not",
    "BitAnd", "BitOr", "BitXor", "Shl", "Shr",
    "AddAssign", "SubAssign", "MulAssign", "DivAssign", "RemAssign",
    "BitAndAssign", "BitOrAssign", "BitXorAssign", "ShlAssign", "ShrAssign",
    "Index", "IndexMut", "Deref", "DerefMut",
    "PartialEq", "PartialOrd", "Ord", "Eq",
];

pub struct SynResolver {
    members: Vec<String>,
    files_by_crate: BTreeMap<String, Vec<String>>,
    units: DashMap<UnitId, CallableUnit>,
    units_by_file: DashMap<String, Vec<UnitId>>,
    // Key: (crate, function)
    global_functions: DashMap<(String, String), UnitId>,
    functions_by_name: DashMap<String, Vec<UnitId>>,
    // Key: (TypeName, MethodName)
    type_methods: DashMap<(String, String), UnitId>,
    // Acceleration map: MethodName -> Vec<(TypeName, MethodName)>
    method_lookup: DashMap<String, Vec<(String, String)>>,
    call_sites: DashMap<UnitId, Vec<CallSite>>,
    docs: DashMap<UnitId, String>,
}

impl SynResolver {
    /// Parse and index a loaded workspace.
    pub fn build(workspace: &LoadedWorkspace) -> Self {
        let harvests: DashMap<String, FileHarvest> = DashMap::new();
        workspace.files.par_iter().for_each(|file| {
            if let Some(harvest) = harvest_file(&file.krate, &file.path, &file.text) {
                harvests.insert(file.path.clone(), harvest);
            }
        });

        let mut resolver = SynResolver {
            members: workspace.members.clone(),
            files_by_crate: BTreeMap::new(),
            units: DashMap::new(),
            units_by_file: DashMap::new(),
            global_functions: DashMap::new(),
            functions_by_name: DashMap::new(),
            type_methods: DashMap::new(),
            method_lookup: DashMap::new(),
            call_sites: DashMap::new(),
            docs: DashMap::new(),
        };

        let mut paths: Vec<String> = harvests.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();

        let mut next_id = 0u32;
        for path in paths {
            let Some((_, harvest)) = harvests.remove(&path) else {
                continue;
            };
            resolver
                .files_by_crate
                .entry(harvest.krate.clone())
                .or_default()
                .push(path.clone());

            for pending in harvest.units {
                next_id += 1;
                let id = UnitId::from_raw(next_id);
                let unit = CallableUnit {
                    id,
                    name: pending.name,
                    parent: pending.parent,
                    file: path.clone(),
                    span: pending.span,
                    kind: pending.kind,
                    krate: harvest.krate.clone(),
                    from_source: true,
                    is_implicit: pending.implicit,
                    signature: pending.signature,
                };
                resolver.index_unit(&unit);
                if let Some(doc) = pending.doc {
                    resolver.docs.insert(id, doc);
                }
                let sites: Vec<CallSite> = pending
                    .calls
                    .into_iter()
                    .enumerate()
                    .map(|(ordinal, call)| CallSite {
                        caller: id,
                        ordinal: ordinal as u32,
                        callee: call.callee,
                        qualifier: call.qualifier,
                        is_method: call.is_method,
                    })
                    .collect();
                resolver.call_sites.insert(id, sites);
                resolver
                    .units_by_file
                    .entry(path.clone())
                    .or_default()
                    .push(id);
                resolver.units.insert(id, unit);
            }
        }

        resolver
    }

    fn index_unit(&self, unit: &CallableUnit) {
        match &unit.parent {
            Some(parent) => {
                let key = (parent.clone(), unit.name.clone());
                self.type_methods.entry(key.clone()).or_insert(unit.id);
                self.method_lookup
                    .entry(unit.name.clone())
                    .or_default()
                    .push(key);
            }
            None => {
                self.global_functions
                    .entry((unit.krate.clone(), unit.name.clone()))
                    .or_insert(unit.id);
                self.functions_by_name
                    .entry(unit.name.clone())
                    .or_default()
                    .push(unit.id);
            }
        }
    }

    fn direct(&self, id: UnitId) -> Resolution {
        match self.units.get(&id) {
            Some(unit) => Resolution::Direct(unit.clone()),
            None => Resolution::Unresolved,
        }
    }

    /// Returns cloned units to avoid holding map locks across resolution.
    fn method_candidates(&self, name: &str) -> Vec<UnitId> {
        let keys = self
            .method_lookup
            .get(name)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        let mut ids: Vec<UnitId> = keys
            .iter()
            .filter_map(|key| self.type_methods.get(key).map(|id| *id))
            .collect();
        // Two trait impls on one type can share a method name; the lookup
        // key then repeats and must not fake an ambiguity.
        ids.sort();
        ids.dedup();
        ids
    }

    fn from_candidates(&self, ids: Vec<UnitId>) -> Resolution {
        let mut units: Vec<CallableUnit> = ids
            .iter()
            .filter_map(|id| self.units.get(id).map(|unit| unit.clone()))
            .collect();
        match units.len() {
            0 => Resolution::Unresolved,
            1 => Resolution::Direct(units.remove(0)),
            _ => {
                units.sort_by(candidate_order);
                Resolution::Ambiguous(units)
            }
        }
    }
}

/// Order in which ambiguous candidates are reported: declaring type, then
/// file and position. The first entry is the one an edge will use.
fn candidate_order(a: &CallableUnit, b: &CallableUnit) -> Ordering {
    a.parent
        .as_deref()
        .unwrap_or("")
        .cmp(b.parent.as_deref().unwrap_or(""))
        .then_with(|| a.file.cmp(&b.file))
        .then_with(|| a.span.start_line.cmp(&b.span.start_line))
        .then_with(|| a.id.cmp(&b.id))
}

impl SemanticResolver for SynResolver {
    fn projects(&self) -> Vec<ProjectRef> {
        self.members
            .iter()
            .map(|name| ProjectRef { name: name.clone() })
            .collect()
    }

    fn documents(&self, project: &ProjectRef) -> Vec<DocumentRef> {
        self.files_by_crate
            .get(&project.name)
            .map(|paths| {
                paths
                    .iter()
                    .map(|path| DocumentRef {
                        project: project.name.clone(),
                        path: path.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn declared_units(&self, document: &DocumentRef) -> Vec<CallableUnit> {
        let ids = self
            .units_by_file
            .get(&document.path)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.units.get(id).map(|unit| unit.clone()))
            .collect()
    }

    fn call_sites(&self, unit: UnitId) -> Vec<CallSite> {
        self.call_sites
            .get(&unit)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    fn resolve_call(&self, site: &CallSite) -> Resolution {
        if let Some(qualifier) = &site.qualifier {
            let key = (qualifier.clone(), site.callee.clone());
            if let Some(id) = self.type_methods.get(&key).map(|id| *id) {
                return self.direct(id);
            }
            // Crate-qualified free function.
            if self.members.iter().any(|m| m == qualifier) {
                if let Some(id) = self.global_functions.get(&key).map(|id| *id) {
                    return self.direct(id);
                }
            }
        }

        if site.is_method {
            return self.from_candidates(self.method_candidates(&site.callee));
        }

        // Free call: a declaration in the caller's own crate shadows
        // same-named declarations elsewhere.
        let caller_crate = self.units.get(&site.caller).map(|unit| unit.krate.clone());
        if let Some(krate) = caller_crate {
            if let Some(id) = self
                .global_functions
                .get(&(krate, site.callee.clone()))
                .map(|id| *id)
            {
                return self.direct(id);
            }
        }
        let ids = self
            .functions_by_name
            .get(&site.callee)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        self.from_candidates(ids)
    }

    fn raw_documentation(&self, unit: UnitId) -> Option<String> {
        self.docs.get(&unit).map(|entry| entry.clone())
    }
}

struct FileHarvest {
    krate: String,
    units: Vec<PendingUnit>,
}

struct PendingUnit {
    name: String,
    parent: Option<String>,
    kind: UnitKind,
    span: SourceSpan,
    signature: String,
    doc: Option<String>,
    implicit: bool,
    calls: Vec<RawCall>,
}

struct RawCall {
    callee: String,
    qualifier: Option<String>,
    is_method: bool,
}

fn harvest_file(krate: &str, path: &str, text: &str) -> Option<FileHarvest> {
    let ast = match syn::parse_file(text) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("WARN: Failed to parse {}: {}", path, e);
            return None;
        }
    };
    let lines: Vec<&str> = text.lines().collect();
    let mut units = Vec::new();
    harvest_items(krate, &lines, &ast.items, &mut units);
    Some(FileHarvest {
        krate: krate.to_string(),
        units,
    })
}

/// Walk items recursively, collecting every declaration with a body: free
/// functions, impl methods, and trait methods carrying a default body.
fn harvest_items(krate: &str, lines: &[&str], items: &[Item], out: &mut Vec<PendingUnit>) {
    for item in items {
        match item {
            Item::Fn(func) => {
                out.push(pending_fn(
                    krate,
                    lines,
                    &func.attrs,
                    Some(&func.vis),
                    &func.sig,
                    &func.block,
                    None,
                    false,
                ));
            }
            Item::Impl(imp) => {
                let Some(type_name) = impl_type_name(imp) else {
                    continue;
                };
                let operator_impl = imp
                    .trait_
                    .as_ref()
                    .map(|(_, trait_path, _)| is_operator_trait(trait_path))
                    .unwrap_or(false);
                let impl_implicit = has_automatically_derived(&imp.attrs);
                for impl_item in &imp.items {
                    if let ImplItem::Fn(method) = impl_item {
                        let mut unit = pending_fn(
                            krate,
                            lines,
                            &method.attrs,
                            Some(&method.vis),
                            &method.sig,
                            &method.block,
                            Some(&type_name),
                            operator_impl,
                        );
                        unit.implicit |= impl_implicit;
                        out.push(unit);
                    }
                }
            }
            Item::Trait(tr) => {
                let trait_name = tr.ident.to_string();
                let operator_trait = OPERATOR_TRAITS.contains(&trait_name.as_str());
                for trait_item in &tr.items {
                    if let TraitItem::Fn(method) = trait_item {
                        if let Some(block) = &method.default {
                            out.push(pending_fn(
                                krate,
                                lines,
                                &method.attrs,
                                None,
                                &method.sig,
                                block,
                                Some(&trait_name),
                                operator_trait,
                            ));
                        }
                    }
                }
            }
            Item::Mod(module) => {
                // Recurse into inline modules
                if let Some((_, content)) = &module.content {
                    harvest_items(krate, lines, content, out);
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn pending_fn(
    krate: &str,
    lines: &[&str],
    attrs: &[Attribute],
    vis: Option<&Visibility>,
    sig: &Signature,
    block: &Block,
    parent: Option<&str>,
    operator_scope: bool,
) -> PendingUnit {
    let name = sig.ident.to_string();
    let has_receiver = sig
        .inputs
        .first()
        .map(|arg| matches!(arg, FnArg::Receiver(_)))
        .unwrap_or(false);
    let kind = classify(parent, &name, has_receiver, operator_scope, sig, block);

    let start = signature_start(vis, sig);
    let span = SourceSpan {
        start_line: start.line as u32,
        end_line: block.brace_token.span.close().end().line as u32,
    };
    let signature = slice_signature(lines, start, sig.span().end())
        .unwrap_or_else(|| format!("fn {}", name));

    PendingUnit {
        parent: parent.map(str::to_string),
        kind,
        span,
        signature,
        doc: doc_text(attrs),
        implicit: has_automatically_derived(attrs),
        calls: collect_calls(krate, parent, block),
        name,
    }
}

fn classify(
    parent: Option<&str>,
    name: &str,
    has_receiver: bool,
    operator_scope: bool,
    sig: &Signature,
    block: &Block,
) -> UnitKind {
    if parent.is_none() {
        return UnitKind::Function;
    }
    if operator_scope {
        return UnitKind::Operator;
    }
    if !has_receiver {
        return if name == "new" {
            UnitKind::Constructor
        } else {
            UnitKind::Function
        };
    }
    if is_accessor(sig, block) {
        UnitKind::Accessor
    } else {
        UnitKind::Method
    }
}

/// A trivial getter (`fn x(&self) -> T { self.x }`, optionally `&` or
/// `.clone()`) or setter (`fn set_x(&mut self, v: T) { self.x = v; }`).
fn is_accessor(sig: &Signature, block: &Block) -> bool {
    if block.stmts.len() != 1 {
        return false;
    }
    let arg_count = sig.inputs.len();
    match &block.stmts[0] {
        Stmt::Expr(Expr::Assign(assign), _) => arg_count == 2 && is_self_field(&assign.left),
        Stmt::Expr(expr, None) => arg_count == 1 && is_self_field(expr),
        _ => false,
    }
}

fn is_self_field(expr: &Expr) -> bool {
    match expr {
        Expr::Field(field) => matches!(&*field.base, Expr::Path(p) if p.path.is_ident("self")),
        Expr::Reference(reference) => is_self_field(&reference.expr),
        Expr::MethodCall(call) if call.method == "clone" && call.args.is_empty() => {
            is_self_field(&call.receiver)
        }
        _ => false,
    }
}

fn impl_type_name(imp: &ItemImpl) -> Option<String> {
    if let Type::Path(tp) = &*imp.self_ty {
        tp.path.segments.last().map(|segment| segment.ident.to_string())
    } else {
        None
    }
}

fn is_operator_trait(path: &syn::Path) -> bool {
    path.segments
        .last()
        .map(|segment| OPERATOR_TRAITS.contains(&segment.ident.to_string().as_str()))
        .unwrap_or(false)
}

fn has_automatically_derived(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .any(|attr| attr.path().is_ident("automatically_derived"))
}

/// Join `#[doc]` attribute lines into one raw payload, preserved verbatim
/// for the documentation extractor.
fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let mut doc_lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(nv) = &attr.meta {
            if let Expr::Lit(lit) = &nv.value {
                if let Lit::Str(s) = &lit.lit {
                    doc_lines.push(s.value());
                }
            }
        }
    }
    if doc_lines.is_empty() {
        None
    } else {
        Some(doc_lines.join("\n"))
    }
}

fn signature_start(vis: Option<&Visibility>, sig: &Signature) -> LineColumn {
    match vis {
        Some(Visibility::Public(token)) => token.span.start(),
        Some(Visibility::Restricted(restricted)) => restricted.pub_token.span.start(),
        _ => sig.span().start(),
    }
}

/// Slice the declaration text between two positions and collapse it to one
/// line. Columns are counted in characters, matching span locations.
fn slice_signature(lines: &[&str], start: LineColumn, end: LineColumn) -> Option<String> {
    if start.line == 0 || start.line > lines.len() || end.line < start.line {
        return None;
    }
    let end_line = end.line.min(lines.len());

    let mut pieces = Vec::new();
    for (offset, line) in lines[start.line - 1..end_line].iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let lo = if offset == 0 {
            start.column.min(chars.len())
        } else {
            0
        };
        let hi = if start.line + offset == end.line {
            end.column.min(chars.len())
        } else {
            chars.len()
        };
        if lo <= hi {
            pieces.push(chars[lo..hi].iter().collect::<String>());
        }
    }

    let text = collapse_ws(&pieces.join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn collect_calls(krate: &str, self_type: Option<&str>, block: &Block) -> Vec<RawCall> {
    let mut collector = CallCollector {
        krate,
        self_type,
        calls: Vec::new(),
    };
    collector.visit_block(block);
    collector.calls
}

struct CallCollector<'a> {
    krate: &'a str,
    self_type: Option<&'a str>,
    calls: Vec<RawCall>,
}

impl<'a> CallCollector<'a> {
    fn substitute(&self, segment: &str) -> String {
        if segment == "Self" {
            if let Some(self_type) = self.self_type {
                return self_type.to_string();
            }
        }
        if segment == "crate" {
            return self.krate.to_string();
        }
        segment.to_string()
    }
}

impl<'a, 'ast> Visit<'ast> for CallCollector<'a> {
    fn visit_item(&mut self, _item: &'ast Item) {
        // Items nested in a body declare their own scopes; their calls do
        // not belong to this unit.
    }

    fn visit_expr_call(&mut self, node: &'ast ExprCall) {
        if let Expr::Path(path) = &*node.func {
            let segments: Vec<String> = path
                .path
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect();
            if let Some(name) = segments.last() {
                let qualifier = if segments.len() >= 2 {
                    Some(self.substitute(&segments[segments.len() - 2]))
                } else {
                    None
                };
                self.calls.push(RawCall {
                    callee: name.clone(),
                    qualifier,
                    is_method: false,
                });
            }
        }
        visit::visit_expr_call(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        let qualifier = match &*node.receiver {
            Expr::Path(path) if path.path.is_ident("self") => {
                self.self_type.map(str::to_string)
            }
            _ => None,
        };
        self.calls.push(RawCall {
            callee: node.method.to_string(),
            qualifier,
            is_method: true,
        });
        visit::visit_expr_method_call(self, node);
    }
}

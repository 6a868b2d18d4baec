/// Benchmarks for the callvault analysis pipeline.
///
/// Run with: `cargo bench`
///
/// Covers:
/// - Source indexing at various workspace sizes
/// - Graph building and note rendering over pre-resolved facts
/// - Mmap loading vs traditional read for SCIP index files

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use memmap2::Mmap;
use protobuf::Message;
use tempfile::tempdir;

use callvault::domain::callgraph::GraphBuilder;
use callvault::domain::canonical::Resolution;
use callvault::domain::scope::ScopeFilter;
use callvault::domain::unit::{CallableUnit, SourceSpan, UnitKind};
use callvault::infrastructure::memory_resolver::MemoryResolver;
use callvault::infrastructure::project_loader::{LoadedWorkspace, SourceFile};
use callvault::infrastructure::syn_resolver::SynResolver;
use callvault::ports::note_renderer::render_file_notes;
use callvault::ports::SemanticResolver;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// Build one source file where every function calls the next one.
fn synthetic_source(file_idx: usize, fns_per_file: usize) -> String {
    let mut src = String::new();
    for fn_idx in 0..fns_per_file {
        let next = (fn_idx + 1) % fns_per_file;
        src.push_str(&format!(
            "/// Unit {fn_idx} of file {file_idx}.\n\
             pub fn func_{file_idx}_{fn_idx}() {{\n    func_{file_idx}_{next}();\n}}\n\n"
        ));
    }
    src
}

fn synthetic_workspace(num_files: usize, fns_per_file: usize) -> LoadedWorkspace {
    let files = (0..num_files)
        .map(|idx| SourceFile {
            krate: "bench_crate".to_string(),
            path: format!("bench_crate/src/file_{idx}.rs"),
            text: synthetic_source(idx, fns_per_file),
        })
        .collect();
    LoadedWorkspace {
        root: PathBuf::from("."),
        members: vec!["bench_crate".to_string()],
        files,
    }
}

/// Pre-resolved facts: a single call chain through `num_units` units.
fn synthetic_resolver(num_units: usize) -> MemoryResolver {
    let mut resolver = MemoryResolver::default();
    let ids: Vec<_> = (0..num_units).map(|_| resolver.mint_id()).collect();

    for (idx, id) in ids.iter().enumerate() {
        resolver.add_unit(CallableUnit {
            id: *id,
            name: format!("func_{idx}"),
            parent: None,
            file: format!("src/file_{}.rs", idx / 25),
            span: SourceSpan {
                start_line: (idx * 3) as u32 + 1,
                end_line: (idx * 3) as u32 + 3,
            },
            kind: UnitKind::Function,
            krate: "bench_crate".to_string(),
            from_source: true,
            is_implicit: false,
            signature: format!("pub fn func_{idx}()"),
        });
    }
    for (idx, id) in ids.iter().enumerate() {
        let next = (idx + 1) % num_units;
        let name = format!("func_{next}");
        let target = resolver.unit(ids[next]).cloned().unwrap();
        resolver.add_call(*id, &name, Resolution::Direct(target));
    }
    resolver
}

/// Create a synthetic SCIP index with configurable size.
fn synthetic_scip_index(
    num_documents: usize,
    defs_per_doc: usize,
    refs_per_doc: usize,
) -> scip::types::Index {
    let mut index = scip::types::Index::new();

    for doc_idx in 0..num_documents {
        let mut doc = scip::types::Document::new();
        doc.relative_path = format!("src/file_{doc_idx}.rs");

        for def_idx in 0..defs_per_doc {
            let mut occ = scip::types::Occurrence::new();
            occ.symbol =
                format!("rust-analyzer cargo bench_crate 0.1.0 file_{doc_idx}/func_{def_idx}().");
            let start_line = (def_idx * 20) as i32;
            occ.range = vec![start_line, 7, start_line, 15];
            occ.enclosing_range = vec![start_line, 0, start_line + 15, 1];
            occ.symbol_roles = 1;
            doc.occurrences.push(occ);
        }

        for ref_idx in 0..refs_per_doc {
            let def_idx = ref_idx % defs_per_doc;
            let target_doc = (doc_idx + 1) % num_documents;
            let mut occ = scip::types::Occurrence::new();
            occ.symbol =
                format!("rust-analyzer cargo bench_crate 0.1.0 file_{target_doc}/func_0().");
            let start_line = (def_idx * 20 + 5) as i32;
            occ.range = vec![start_line, 5, 15];
            occ.symbol_roles = 0;
            doc.occurrences.push(occ);
        }

        index.documents.push(doc);
    }

    index
}

fn write_scip_to_temp(index: &scip::types::Index) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.scip");
    let bytes = index.write_to_bytes().unwrap();
    let mut file = File::create(&path).unwrap();
    file.write_all(&bytes).unwrap();
    (dir, path)
}

// ═══════════════════════════════════════════════════════════════════════════
// Source Indexing Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_syn_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("syn_index/full_pipeline");

    for num_files in [10, 50, 100].iter() {
        let fns_per_file = 20;
        let workspace = synthetic_workspace(*num_files, fns_per_file);

        group.throughput(Throughput::Elements((num_files * fns_per_file) as u64));
        group.bench_with_input(
            BenchmarkId::new("files", num_files),
            &workspace,
            |b, ws| b.iter(|| SynResolver::build(black_box(ws))),
        );
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Graph Building and Rendering Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_graph_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/build_and_render");
    let scope = ScopeFilter::new(vec!["bench_crate".to_string()]);

    for num_units in [100, 500, 1000].iter() {
        let resolver = synthetic_resolver(*num_units);
        group.throughput(Throughput::Elements(*num_units as u64));

        group.bench_with_input(
            BenchmarkId::new("build", num_units),
            &resolver,
            |b, resolver| b.iter(|| GraphBuilder::new(resolver, &scope).build()),
        );

        let graph = GraphBuilder::new(&resolver, &scope).build();
        let docs: BTreeMap<_, _> = graph
            .units()
            .filter_map(|u| resolver.raw_documentation(u.id).map(|d| (u.id, d)))
            .collect();
        group.bench_with_input(
            BenchmarkId::new("render_file_notes", num_units),
            &graph,
            |b, graph| b.iter(|| render_file_notes(black_box(graph), &docs)),
        );
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Mmap vs Traditional Read Comparison
// ═══════════════════════════════════════════════════════════════════════════

fn bench_mmap_vs_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("scip_load/mmap_vs_read");

    let index = synthetic_scip_index(200, 30, 60);
    let (_dir, path) = write_scip_to_temp(&index);

    let file_size = std::fs::metadata(&path).unwrap().len();
    group.throughput(Throughput::Bytes(file_size));

    group.bench_function("traditional_read", |b| {
        b.iter(|| {
            let mut file = File::open(&path).unwrap();
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer).unwrap();
            scip::types::Index::parse_from_bytes(black_box(&buffer)).unwrap()
        })
    });

    group.bench_function("mmap_read", |b| {
        b.iter(|| {
            let file = File::open(&path).unwrap();
            let mmap = unsafe { Mmap::map(&file) }.unwrap();
            scip::types::Index::parse_from_bytes(black_box(&mmap)).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_syn_indexing,
    bench_graph_and_render,
    bench_mmap_vs_read
);
criterion_main!(benches);

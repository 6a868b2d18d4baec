use cargo_metadata::MetadataCommand;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};

/// One source file owned by a workspace member, text preloaded.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub krate: String,
    /// Workspace-relative path with forward slashes.
    pub path: String,
    pub text: String,
}

/// Member crate names plus every member source file, ready for indexing.
#[derive(Debug, Clone)]
pub struct LoadedWorkspace {
    pub root: PathBuf,
    pub members: Vec<String>,
    pub files: Vec<SourceFile>,
}

pub struct ProjectLoader;

impl ProjectLoader {
    /// Load member crates and their sources from a project directory or an
    /// explicit Cargo.toml path. `cargo metadata` is authoritative; when it
    /// cannot run, the manifests are parsed directly.
    pub fn load(project_path: &Path) -> Result<LoadedWorkspace> {
        let manifest = Self::manifest_path(project_path)?;
        match Self::load_via_cargo(&manifest) {
            Ok(workspace) => Ok(workspace),
            Err(e) => {
                eprintln!("WARN: cargo metadata failed ({:#}), parsing manifests directly", e);
                Self::load_via_manifest(&manifest)
            }
        }
    }

    fn manifest_path(project_path: &Path) -> Result<PathBuf> {
        let manifest = if project_path.is_dir() {
            project_path.join("Cargo.toml")
        } else {
            project_path.to_path_buf()
        };
        if !manifest.is_file() {
            bail!("no Cargo.toml found at {}", manifest.display());
        }
        Ok(manifest)
    }

    fn load_via_cargo(manifest: &Path) -> Result<LoadedWorkspace> {
        let metadata = MetadataCommand::new()
            .manifest_path(manifest)
            .no_deps()
            .exec()
            .context("Failed to execute cargo metadata")?;

        let root = metadata.workspace_root.as_std_path().to_path_buf();
        let mut members = Vec::new();
        let mut files = Vec::new();

        for package_id in &metadata.workspace_members {
            if let Some(package) = metadata.packages.iter().find(|p| &p.id == package_id) {
                members.push(package.name.clone());

                for target in &package.targets {
                    if !target.kind.iter().any(|k| k == "lib" || k == "bin" || k == "proc-macro") {
                        continue;
                    }
                    let src_path = &target.src_path;
                    let src_dir = src_path.parent().unwrap_or(src_path);
                    Self::collect_rs_recursive(
                        src_dir.as_std_path(),
                        &package.name,
                        &root,
                        &mut files,
                    )?;
                }
            }
        }

        Ok(Self::finish(root, members, files))
    }

    /// Manifest-only fallback: expand `[workspace] members` (plus the root
    /// package itself, when declared) and walk each member's `src/`.
    fn load_via_manifest(manifest: &Path) -> Result<LoadedWorkspace> {
        let text = fs::read_to_string(manifest)
            .with_context(|| format!("Cannot read {}", manifest.display()))?;
        let parsed: toml::Value = toml::from_str(&text)
            .with_context(|| format!("Invalid toml in {}", manifest.display()))?;
        let root = manifest.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut member_dirs = Vec::new();
        if let Some(members) = parsed
            .get("workspace")
            .and_then(|w| w.get("members"))
            .and_then(|m| m.as_array())
        {
            for entry in members {
                if let Some(pattern) = entry.as_str() {
                    member_dirs.extend(Self::expand_member(&root, pattern)?);
                }
            }
        }
        if parsed.get("package").is_some() {
            member_dirs.push(root.clone());
        }
        if member_dirs.is_empty() {
            bail!(
                "{} declares neither [workspace] members nor [package]",
                manifest.display()
            );
        }

        let mut members = Vec::new();
        let mut files = Vec::new();
        for dir in member_dirs {
            let name = Self::package_name(&dir);
            let src_dir = dir.join("src");
            if src_dir.exists() {
                Self::collect_rs_recursive(&src_dir, &name, &root, &mut files)?;
            }
            members.push(name);
        }

        Ok(Self::finish(root, members, files))
    }

    /// Member entries are literal paths; a trailing `/*` expands to the
    /// crate directories under it.
    fn expand_member(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        if let Some(prefix) = pattern.strip_suffix("/*") {
            let base = root.join(prefix);
            let mut dirs = Vec::new();
            if base.is_dir() {
                for entry in fs::read_dir(&base)? {
                    let path = entry?.path();
                    if path.is_dir() && path.join("Cargo.toml").is_file() {
                        dirs.push(path);
                    }
                }
            }
            dirs.sort();
            Ok(dirs)
        } else {
            Ok(vec![root.join(pattern)])
        }
    }

    fn package_name(dir: &Path) -> String {
        if let Ok(text) = fs::read_to_string(dir.join("Cargo.toml")) {
            if let Ok(parsed) = toml::from_str::<toml::Value>(&text) {
                if let Some(name) = parsed
                    .get("package")
                    .and_then(|p| p.get("name"))
                    .and_then(|n| n.as_str())
                {
                    return name.to_string();
                }
            }
        }
        // Directory name stands in when the member manifest is unreadable.
        dir.file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string())
    }

    fn collect_rs_recursive(
        dir: &Path,
        crate_name: &str,
        root: &Path,
        out: &mut Vec<SourceFile>,
    ) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") {
            return Ok(());
        }
        if !dir.exists() {
            return Ok(());
        }

        if dir.is_file() {
            // Single-file target, like a bare main.rs.
            if let Some(ext) = dir.extension() {
                if ext == "rs" {
                    out.push(Self::read_source(dir, crate_name, root)?);
                }
            }
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                Self::collect_rs_recursive(&path, crate_name, root, out)?;
            } else if let Some(ext) = path.extension() {
                if ext == "rs" {
                    out.push(Self::read_source(&path, crate_name, root)?);
                }
            }
        }
        Ok(())
    }

    fn read_source(path: &Path, crate_name: &str, root: &Path) -> Result<SourceFile> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;
        Ok(SourceFile {
            krate: crate_name.to_string(),
            path: Self::relative_display(root, path),
            text,
        })
    }

    fn relative_display(root: &Path, path: &Path) -> String {
        let rel = path.strip_prefix(root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }

    fn finish(root: PathBuf, mut members: Vec<String>, mut files: Vec<SourceFile>) -> LoadedWorkspace {
        members.sort();
        members.dedup();
        // Dedup files when multiple targets share a src dir (lib + bin).
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        LoadedWorkspace { root, members, files }
    }
}

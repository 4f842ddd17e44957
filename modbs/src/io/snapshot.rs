//! Lockfile and provenance snapshots of the files under `workspace/` and `state/`.
//!
//! A snapshot is a point-in-time scan: both documents are regenerated from
//! scratch on every call and never merged with a previous snapshot. Files are
//! ordered by their root-relative forward-slash path, so identical trees
//! produce byte-identical documents.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::core::types::{
    ArtifactClass, DocMeta, LOCKFILE_SCHEMA, LockedArtifact, LockfileDoc, PROVENANCE_SCHEMA,
    ProvenanceDoc, ProvenanceEntry,
};
use crate::io::storage::write_json;
use crate::io::workspace::WorkspacePaths;

const HASH_CHUNK_BYTES: usize = 8 * 1024;
const SCANNED_DIRS: [&str; 2] = ["workspace", "state"];
/// Snapshot outputs never list themselves.
const EXCLUDED_PATHS: [&str; 2] = ["state/lockfile.json", "state/provenance.json"];

/// File selected for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Root-relative, forward-slash path.
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// Both documents produced by one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateArtifacts {
    pub lockfile: LockfileDoc,
    pub provenance: ProvenanceDoc,
}

/// Regular files under `workspace/` and `state/` plus existing `extra_paths`,
/// sorted by relative path.
///
/// Relative extra paths are resolved against `root`. Missing extra paths are
/// ignored; an existing one outside `root` is an error.
pub fn collect_output_files(root: &Path, extra_paths: &[PathBuf]) -> Result<Vec<OutputFile>> {
    let mut files = Vec::new();

    for dir in SCANNED_DIRS {
        let base = root.join(dir);
        if !base.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.with_context(|| format!("scan {}", base.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel_path = relative_posix(root, entry.path())?;
            if EXCLUDED_PATHS.contains(&rel_path.as_str()) {
                continue;
            }
            files.push(OutputFile {
                rel_path,
                abs_path: entry.into_path(),
            });
        }
    }

    for extra in extra_paths {
        let joined = if extra.is_absolute() {
            extra.clone()
        } else {
            root.join(extra)
        };
        if !joined.is_file() {
            continue;
        }
        let abs_path = normalize(&joined)?;
        let rel_path = relative_posix(&normalize(root)?, &abs_path)?;
        if EXCLUDED_PATHS.contains(&rel_path.as_str()) {
            continue;
        }
        files.push(OutputFile { rel_path, abs_path });
    }

    files.sort_by(|left, right| left.rel_path.cmp(&right.rel_path));
    files.dedup_by(|left, right| left.rel_path == right.rel_path);
    debug!(root = %root.display(), files = files.len(), "collected output files");
    Ok(files)
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(path).with_context(|| format!("resolve {}", path.display()))?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

fn relative_posix(root: &Path, path: &Path) -> Result<String> {
    let Ok(rel) = path.strip_prefix(root) else {
        bail!("{} is outside root {}", path.display(), root.display());
    };
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => bail!("{} is outside root {}", path.display(), root.display()),
        }
    }
    Ok(parts.join("/"))
}

/// `sha256:<lowercase hex>` of the file contents, read in fixed-size chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_BYTES];
    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        }
    }
    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

pub fn build_lockfile(root: &Path, release_id: &str, extra_paths: &[PathBuf]) -> Result<LockfileDoc> {
    lockfile_from(&collect_output_files(root, extra_paths)?, release_id)
}

pub fn build_provenance(root: &Path, extra_paths: &[PathBuf]) -> Result<ProvenanceDoc> {
    Ok(provenance_from(&collect_output_files(root, extra_paths)?))
}

fn lockfile_from(files: &[OutputFile], release_id: &str) -> Result<LockfileDoc> {
    let artifacts = files
        .iter()
        .map(|file| {
            Ok(LockedArtifact {
                path: file.rel_path.clone(),
                hash: sha256_file(&file.abs_path)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LockfileDoc {
        meta: DocMeta {
            schema: LOCKFILE_SCHEMA.to_string(),
        },
        release_id: release_id.to_string(),
        artifacts,
    })
}

fn provenance_from(files: &[OutputFile]) -> ProvenanceDoc {
    ProvenanceDoc {
        meta: DocMeta {
            schema: PROVENANCE_SCHEMA.to_string(),
        },
        artifacts: files
            .iter()
            .map(|file| ProvenanceEntry {
                path: file.rel_path.clone(),
                class: ArtifactClass::Generated,
            })
            .collect(),
    }
}

/// Scan once, then write `state/lockfile.json` and `state/provenance.json`.
#[instrument(skip_all, fields(root = %root.display(), release_id = %release_id))]
pub fn write_state_artifacts(
    root: &Path,
    release_id: &str,
    extra_paths: &[PathBuf],
) -> Result<StateArtifacts> {
    let paths = WorkspacePaths::new(root);
    let files = collect_output_files(root, extra_paths)?;
    let lockfile = lockfile_from(&files, release_id)?;
    let provenance = provenance_from(&files);

    write_json(&paths.lockfile_path, &lockfile)?;
    write_json(&paths.provenance_path, &provenance)?;
    debug!(artifacts = lockfile.artifacts.len(), "state artifacts written");
    Ok(StateArtifacts {
        lockfile,
        provenance,
    })
}

use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub mod commands;

/// Absolute form of an audit root given on the command line.
///
/// `.` maps to the working directory. A root that does not exist yet (as with
/// `init` on a fresh directory) is joined onto the working directory instead of
/// being canonicalized.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let cwd = || env::current_dir().context("Failed to get current directory");
    let path = Path::new(root);
    if path == Path::new(".") {
        return cwd();
    }
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) => Ok(cwd()?.join(path)),
    }
}

/// Audit name derived from the root directory, `unnamed-audit` for `/`.
pub fn infer_audit_name(root: &Path) -> String {
    root.file_name().and_then(|name| name.to_str()).unwrap_or("unnamed-audit").to_string()
}

/// Locate an IR dump named on the command line.
///
/// Relative paths are looked up under the audit root first, so dumps kept next
/// to `.ffi-audit/` can be named without a prefix; otherwise they stay relative
/// to the working directory.
pub fn resolve_program_path(root: &Path, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let under_root = root.join(path);
    if under_root.is_file() {
        under_root
    } else {
        path.to_path_buf()
    }
}

/// SHA-256 of an IR dump as lowercase hex; identifies the input of a run.
pub fn program_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open IR dump for hashing: {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to hash IR dump: {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

use std::path::Path;

use ffi_audit::commands::tri_flag;
use ffi_audit::{canonicalize_or_current, infer_audit_name, program_digest, resolve_program_path};
use tempfile::tempdir;

#[test]
fn canonicalize_handles_dot_existing_and_missing_paths() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(canonicalize_or_current(".").unwrap(), cwd);

    let temp = tempdir().unwrap();
    let existing = canonicalize_or_current(&temp.path().to_string_lossy()).unwrap();
    assert_eq!(existing, temp.path().canonicalize().unwrap());

    let missing = canonicalize_or_current("does/not/exist").unwrap();
    assert_eq!(missing, cwd.join("does/not/exist"));
}

#[test]
fn project_name_falls_back_for_root() {
    assert_eq!(infer_audit_name(Path::new("/tmp/libcrypto")), "libcrypto");
    assert_eq!(infer_audit_name(Path::new("/")), "unnamed-audit");
}

#[test]
fn program_digest_is_sha256_hex() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("abc.txt");
    std::fs::write(&path, "abc").unwrap();
    assert_eq!(
        program_digest(&path).unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert!(program_digest(&temp.path().join("missing")).is_err());
}

#[test]
fn tri_flag_renders_unset_as_dash() {
    assert_eq!(tri_flag(Some(true)), "1");
    assert_eq!(tri_flag(Some(false)), "0");
    assert_eq!(tri_flag(None), "-");
}

#[test]
fn relative_programs_prefer_the_audit_root() {
    let temp = tempdir().unwrap();
    std::fs::create_dir_all(temp.path().join("dumps")).unwrap();
    std::fs::write(temp.path().join("dumps/lib.json"), "{}").unwrap();

    assert_eq!(
        resolve_program_path(temp.path(), "dumps/lib.json"),
        temp.path().join("dumps/lib.json")
    );
    assert_eq!(resolve_program_path(temp.path(), "elsewhere.json"), Path::new("elsewhere.json"));
    assert_eq!(resolve_program_path(temp.path(), "/abs/lib.json"), Path::new("/abs/lib.json"));
}

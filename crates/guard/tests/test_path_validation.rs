//! Tests for containment and traversal rejection

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use tidybox_guard::{Allowlist, ErrorKind, Validator};

fn seeded(roots: &[&Path]) -> Allowlist {
    let validator = Validator::default();
    let allowlist = Allowlist::new();
    allowlist.seed(
        roots
            .iter()
            .map(|r| validator.validate_root(r.to_str().unwrap()).unwrap()),
    );
    allowlist
}

#[test]
fn test_inside_allowlist_succeeds() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("Downloads");
    fs::create_dir_all(inbox.join("nested")).unwrap();
    fs::write(inbox.join("nested").join("a.pdf"), "pdf").unwrap();

    let allowlist = seeded(&[&inbox]);
    let validator = Validator::default();

    for candidate in [
        inbox.clone(),
        inbox.join("nested"),
        inbox.join("nested").join("a.pdf"),
    ] {
        let result = validator.validate_existing(candidate.to_str().unwrap(), &allowlist.snapshot());
        assert!(result.is_ok(), "expected {:?} to validate", candidate);
    }
}

#[test]
fn test_outside_allowlist_fails() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("Downloads");
    fs::create_dir(&inbox).unwrap();
    let outside = temp.path().join("secret.txt");
    fs::write(&outside, "secret").unwrap();

    let allowlist = seeded(&[&inbox]);
    let err = Validator::default()
        .validate_existing(outside.to_str().unwrap(), &allowlist.snapshot())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OutsideAllowlist);
    assert!(err.to_string().contains("outside the allowed folders"));
}

#[test]
fn test_sibling_with_shared_prefix_fails() {
    let temp = TempDir::new().unwrap();
    let allowed = temp.path().join("allowed");
    let sibling = temp.path().join("allowedfoo");
    fs::create_dir(&allowed).unwrap();
    fs::create_dir(&sibling).unwrap();

    let allowlist = seeded(&[&allowed]);
    let err = Validator::default()
        .validate_existing(sibling.to_str().unwrap(), &allowlist.snapshot())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OutsideAllowlist);
}

#[test]
fn test_traversal_rejected_even_when_target_is_allowed() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("Downloads");
    let system = temp.path().join("Windows").join("System32");
    fs::create_dir_all(&inbox).unwrap();
    fs::create_dir_all(&system).unwrap();

    // The whole temp tree is allowed, yet a raw `..` still fails
    let allowlist = seeded(&[temp.path(), &inbox]);
    let candidate = format!("{}/../../Windows/System32", inbox.display());

    let err = Validator::default()
        .validate_existing(&candidate, &allowlist.snapshot())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutsideAllowlist);
}

#[test]
fn test_windows_style_traversal_rejected() {
    let allowlist = Allowlist::new();
    let err = Validator::default()
        .validate_existing(r"C:\Downloads\..\..\Windows\System32", &allowlist.snapshot())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutsideAllowlist);
}

#[test]
fn test_dots_in_names_are_not_traversal() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("archive..tar");
    fs::write(&file, "x").unwrap();

    let allowlist = seeded(&[temp.path()]);
    assert!(Validator::default()
        .validate_existing(file.to_str().unwrap(), &allowlist.snapshot())
        .is_ok());
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_fails() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("Downloads");
    let outside = temp.path().join("outside");
    fs::create_dir(&inbox).unwrap();
    fs::create_dir(&outside).unwrap();
    fs::write(outside.join("loot.txt"), "x").unwrap();
    std::os::unix::fs::symlink(&outside, inbox.join("link")).unwrap();

    let allowlist = seeded(&[&inbox]);
    let candidate = inbox.join("link").join("loot.txt");

    let err = Validator::default()
        .validate_existing(candidate.to_str().unwrap(), &allowlist.snapshot())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutsideAllowlist);
}

#[test]
fn test_added_root_visible_to_later_validation() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("Downloads");
    let elsewhere = temp.path().join("Elsewhere");
    fs::create_dir(&inbox).unwrap();
    fs::create_dir(&elsewhere).unwrap();

    let validator = Validator::default();
    let allowlist = seeded(&[&inbox]);
    let candidate = elsewhere.to_str().unwrap();

    assert!(validator
        .validate_existing(candidate, &allowlist.snapshot())
        .is_err());

    allowlist.add(validator.validate_root(candidate).unwrap());

    assert!(validator
        .validate_existing(candidate, &allowlist.snapshot())
        .is_ok());
}

#[test]
fn test_concurrent_readers_during_adds() {
    let temp = TempDir::new().unwrap();
    let validator = Validator::default();
    let allowlist = Arc::new(Allowlist::new());

    let dirs: Vec<_> = (0..16)
        .map(|i| {
            let dir = temp.path().join(format!("dir{}", i));
            fs::create_dir(&dir).unwrap();
            validator.validate_root(dir.to_str().unwrap()).unwrap()
        })
        .collect();

    let writer = {
        let allowlist = Arc::clone(&allowlist);
        let dirs = dirs.clone();
        thread::spawn(move || {
            for dir in dirs {
                allowlist.add(dir);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let allowlist = Arc::clone(&allowlist);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..200 {
                    let len = allowlist.snapshot().len();
                    assert!(len >= last, "snapshot shrank from {} to {}", last, len);
                    last = len;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(allowlist.snapshot().len(), 16);
}

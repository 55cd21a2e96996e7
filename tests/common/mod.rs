#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Review output with two issues, in the shape `coderabbit --plain` prints.
pub const TWO_ISSUES: &str = "\
File: src/main.rs
Line: 10 to 12
Type: potential_issue

Comment:
Unchecked unwrap on user input

Prompt for AI Agent:
Handle the error in src/main.rs around line 10.
=============================================================================
File: src/lib.rs
Line: 3
Type: nitpick

Comment:
Unused import";

/// Write an executable shell script standing in for the review CLI.
pub fn write_fake_cli(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("coderabbit");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A fake CLI that answers reviews with `review` and `usage --json` with `usage_json`.
pub fn fake_cli(dir: &Path, review: &str, usage_json: &str) -> PathBuf {
    let review_file = dir.join("review.txt");
    fs::write(&review_file, review).unwrap();
    let body = format!(
        "case \"$1\" in\n  usage)\n    [ \"$2\" = \"--json\" ] && echo '{usage_json}' && exit 0\n    exit 1 ;;\n  *)\n    cat '{}' ;;\nesac",
        review_file.display()
    );
    write_fake_cli(dir, &body)
}

// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");

    // Packaged builds set the version explicitly
    let version = if let Ok(v) = std::env::var("SIMPLE_CAMERA_VERSION") {
        v
    } else {
        git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` output without the leading `v`, e.g. "0.1.0-3-gabcdef1"
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if described.is_empty() {
        return None;
    }
    Some(
        described
            .strip_prefix('v')
            .unwrap_or(&described)
            .to_string(),
    )
}

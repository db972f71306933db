//! Build script for the ejbmd binary
//!
//! Stamps the binary with the commit it was built from and the build time so
//! the startup banner identifies exactly which rule set produced a report.

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=EJBMD_GIT_HASH={}", hash);
    println!("cargo:rustc-env=EJBMD_BUILD_TIMESTAMP={}", stamp);
    println!("cargo:rustc-env=EJBMD_BUILD_PROFILE={}", profile);
}

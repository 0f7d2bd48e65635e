use std::process::Command;

fn main() {
    // Docker builds have no .git, so they pass GIT_SHA instead.
    let git_sha = std::env::var("GIT_SHA").ok().or_else(|| {
        Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    });

    println!(
        "cargo:rustc-env=GIT_SHA={}",
        git_sha.unwrap_or_else(|| "unknown".to_string())
    );
    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
    // sqlx::migrate! embeds these at compile time.
    println!("cargo:rerun-if-changed=migrations");
}

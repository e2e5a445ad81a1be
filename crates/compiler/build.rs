//! Build script for norn-compiler
//!
//! The runtime crate builds as a static library (it is a build
//! dependency, so cargo compiles it first). This script finds the
//! resulting `libnorn_runtime.a` in the target directory and exports
//! its path so lib.rs can embed it with `include_bytes!`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // OUT_DIR = target/<profile>/build/<pkg>-<hash>/out; the artifacts
    // live three levels up, either directly or under deps/ with a
    // hashed name.
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let target_dir = out_dir
        .ancestors()
        .nth(3)
        .expect("unexpected OUT_DIR layout")
        .to_path_buf();

    let runtime_lib = find_runtime_lib(&target_dir).unwrap_or_else(|| {
        panic!(
            "libnorn_runtime.a not found under {} - \
             is the norn-runtime build dependency intact?",
            target_dir.display()
        )
    });

    println!(
        "cargo:rustc-env=NORN_RUNTIME_LIB_PATH={}",
        runtime_lib.display()
    );
    println!("cargo:rerun-if-changed={}", runtime_lib.display());
}

fn find_runtime_lib(target_dir: &Path) -> Option<PathBuf> {
    let direct = target_dir.join("libnorn_runtime.a");
    if direct.exists() {
        return Some(direct);
    }
    let deps_dir = target_dir.join("deps");
    fs::read_dir(deps_dir).ok()?.find_map(|entry| {
        let path = entry.ok()?.path();
        let name = path.file_name()?.to_string_lossy();
        if name.starts_with("libnorn_runtime") && name.ends_with(".a") {
            Some(path)
        } else {
            None
        }
    })
}

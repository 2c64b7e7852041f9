#![allow(dead_code, unused_imports)]

pub use hashmake_test_utils::{builders, fake_executor, init_tracing, with_timeout};

use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

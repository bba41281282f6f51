use ignore::WalkBuilder;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use crate::document::is_record_file;

pub const IGNORE_FILENAME: &str = ".ruleqignore";

/// Record files under `root` in a stable order. A plain file is returned
/// as-is whatever its extension.
pub fn collect_record_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .add_custom_ignore_filename(IGNORE_FILENAME)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    walker
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_record_file(path))
        .collect()
}

pub fn read_paths_from_stdin() -> Vec<PathBuf> {
    paths_from_lines(io::stdin().lock())
}

fn paths_from_lines(reader: impl BufRead) -> Vec<PathBuf> {
    reader
        .lines()
        .map_while(Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

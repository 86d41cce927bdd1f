//! Search-path package crawler
//!
//! Walks a list of root directories once and indexes every package found.
//! A directory is a package when it holds a `package.xml` (or the legacy
//! `manifest.xml`). Packages are not descended into, hidden directories and
//! directories containing `CATKIN_IGNORE` are skipped, and when two roots
//! provide the same name the earlier root wins. Symlinked directories are
//! followed; each real directory is visited at most once.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::PackageLookup;
use crate::logger;

const PACKAGE_MANIFEST: &str = "package.xml";
const LEGACY_MANIFEST: &str = "manifest.xml";
const IGNORE_MARKER: &str = "CATKIN_IGNORE";

/// Package index built by crawling search roots
#[derive(Debug, Default)]
pub struct SearchPathLookup {
    index: HashMap<String, PathBuf>,
}

impl SearchPathLookup {
    /// Crawl `roots` in order. Unreadable roots are logged and skipped.
    pub fn crawl(roots: &[PathBuf]) -> Self {
        let mut index = HashMap::new();
        let mut visited = HashSet::new();
        for root in roots {
            let mut found = Vec::new();
            if let Err(e) = crawl_dir(root, &mut visited, &mut found) {
                logger::log_warning(&format!(
                    "Skipping package search path '{}': {e}",
                    root.display()
                ));
                continue;
            }
            for (name, dir) in found {
                index.entry(name).or_insert(dir);
            }
        }
        Self { index }
    }
}

impl PackageLookup for SearchPathLookup {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.index.get(name).cloned()
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

fn crawl_dir(
    dir: &Path,
    visited: &mut HashSet<PathBuf>,
    found: &mut Vec<(String, PathBuf)>,
) -> std::io::Result<()> {
    // symlink loops and roots listed twice end here
    if !visited.insert(fs::canonicalize(dir)?) {
        return Ok(());
    }
    if dir.join(IGNORE_MARKER).exists() {
        return Ok(());
    }

    if let Some(name) = package_name(dir) {
        found.push((name, dir.to_path_buf()));
        return Ok(());
    }

    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    // read_dir order is platform dependent
    children.sort();

    for child in children {
        // unreadable subdirectories are skipped, not fatal to the root
        if let Err(e) = crawl_dir(&child, visited, found) {
            logger::log_debug(&format!("Cannot read '{}': {e}", child.display()));
        }
    }
    Ok(())
}

/// Name of the package rooted at `dir`, if `dir` is a package
fn package_name(dir: &Path) -> Option<String> {
    let dir_name = || dir.file_name().map(|n| n.to_string_lossy().into_owned());

    let manifest = dir.join(PACKAGE_MANIFEST);
    if manifest.is_file() {
        return fs::read_to_string(&manifest)
            .ok()
            .and_then(|xml| manifest_name(&xml))
            .or_else(dir_name);
    }
    if dir.join(LEGACY_MANIFEST).is_file() {
        return dir_name();
    }
    None
}

/// Text of the first `<name>` element in a `package.xml`, ignoring comments
fn manifest_name(xml: &str) -> Option<String> {
    let xml = strip_comments(xml);
    let start = xml.find("<name>")? + "<name>".len();
    let len = xml[start..].find("</name>")?;
    let name = xml[start..start + len].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Drop `<!-- ... -->` blocks. An unterminated comment runs to the end.
fn strip_comments(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        match rest[open + 4..].find("-->") {
            Some(close) => rest = &rest[open + 4 + close + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

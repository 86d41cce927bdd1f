//! Package lookup module
//!
//! Maps a package name to the directory the package lives in. The resolver
//! only sees the [`PackageLookup`] trait, so the daemon can plug in a fixed
//! table, a crawled search path, or both.

mod search;

pub use search::SearchPathLookup;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name -> base directory resolution.
///
/// Implementations are read-only after construction and shared across
/// concurrent requests.
pub trait PackageLookup: Send + Sync {
    /// Base directory of `name`, or `None` if the package is unknown
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Number of packages this lookup knows about
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed name -> directory table
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    packages: HashMap<String, PathBuf>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_package(mut self, name: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        self.insert(name, dir);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, dir: impl AsRef<Path>) {
        self.packages.insert(name.into(), dir.as_ref().to_path_buf());
    }
}

impl FromIterator<(String, String)> for StaticLookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            packages: iter
                .into_iter()
                .map(|(name, dir)| (name, PathBuf::from(dir)))
                .collect(),
        }
    }
}

impl PackageLookup for StaticLookup {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.packages.get(name).cloned()
    }

    fn len(&self) -> usize {
        self.packages.len()
    }
}

/// Consults each lookup in order; the first hit wins
#[derive(Default)]
pub struct ChainLookup {
    lookups: Vec<Arc<dyn PackageLookup>>,
}

impl ChainLookup {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, lookup: Arc<dyn PackageLookup>) -> Self {
        self.lookups.push(lookup);
        self
    }
}

impl PackageLookup for ChainLookup {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.lookups.iter().find_map(|l| l.resolve(name))
    }

    fn len(&self) -> usize {
        self.lookups.iter().map(|l| l.len()).sum()
    }
}

/// Build the daemon's lookup from configuration: the explicit `[packages]`
/// table first, then the crawled search roots.
pub fn from_config(
    cfg: &crate::config::LookupConfig,
    packages: &HashMap<String, String>,
) -> ChainLookup {
    let table: StaticLookup = packages
        .iter()
        .map(|(name, dir)| (name.clone(), dir.clone()))
        .collect();

    let mut roots: Vec<PathBuf> = cfg.search_paths.iter().map(PathBuf::from).collect();
    if cfg.use_ros_package_path {
        if let Some(env_roots) = std::env::var_os("ROS_PACKAGE_PATH") {
            roots.extend(std::env::split_paths(&env_roots));
        }
    }

    ChainLookup::new()
        .then(Arc::new(table))
        .then(Arc::new(SearchPathLookup::crawl(&roots)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookup() {
        let lookup = StaticLookup::new().with_package("foo", "/opt/ros/foo");
        assert_eq!(lookup.resolve("foo"), Some(PathBuf::from("/opt/ros/foo")));
        assert_eq!(lookup.resolve("bar"), None);
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn test_chain_prefers_first() {
        let first = StaticLookup::new().with_package("foo", "/first/foo");
        let second = StaticLookup::new()
            .with_package("foo", "/second/foo")
            .with_package("bar", "/second/bar");
        let chain = ChainLookup::new()
            .then(Arc::new(first))
            .then(Arc::new(second));

        assert_eq!(chain.resolve("foo"), Some(PathBuf::from("/first/foo")));
        assert_eq!(chain.resolve("bar"), Some(PathBuf::from("/second/bar")));
        assert_eq!(chain.resolve("baz"), None);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_empty_chain() {
        let chain = ChainLookup::new();
        assert!(chain.is_empty());
        assert_eq!(chain.resolve("foo"), None);
    }

    #[test]
    fn test_from_config_table_and_search_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let pkg = dir.path().join("crawled_pkg");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(
            pkg.join("package.xml"),
            "<package><name>crawled_pkg</name></package>",
        )
        .unwrap();

        let cfg = crate::config::LookupConfig {
            search_paths: vec![dir.path().to_string_lossy().into_owned()],
            use_ros_package_path: false,
        };
        let mut packages = HashMap::new();
        packages.insert("foo".to_string(), "/opt/ros/foo".to_string());

        let lookup = from_config(&cfg, &packages);
        assert_eq!(lookup.resolve("foo"), Some(PathBuf::from("/opt/ros/foo")));
        assert_eq!(lookup.resolve("crawled_pkg"), Some(pkg));
    }
}

//! Resource resolver
//!
//! Turns a request path into the bytes to send back. The package lookup is
//! injected at construction; the resolver itself holds no mutable state, so
//! one instance serves every connection.

use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::command::{Command, Verb};
use super::ResolveError;
use crate::lookup::PackageLookup;

/// Successful outcome of a request
#[derive(Debug)]
pub enum Resolution {
    /// Whole contents of a package file
    File { target: PathBuf, body: Bytes },
    /// Acknowledged with an empty body (`NODE`)
    Empty,
}

pub struct Resolver {
    lookup: Arc<dyn PackageLookup>,
}

impl Resolver {
    pub fn new(lookup: Arc<dyn PackageLookup>) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &dyn PackageLookup {
        self.lookup.as_ref()
    }

    /// Resolve `path` (the request path, without query string)
    pub async fn resolve(&self, path: &str) -> Result<Resolution, ResolveError> {
        let Some(command) = Command::parse(path) else {
            return Err(ResolveError::UnknownRoute {
                path: path.to_string(),
            });
        };

        match command.verb {
            Verb::Node => Ok(Resolution::Empty),
            Verb::Pkg => {
                let (base, target) = self.locate(path, &command.args)?;
                read_package_file(path, &base, &target).await
            }
        }
    }

    /// Base directory of the package and the unvalidated target path below it
    fn locate(&self, path: &str, args: &[&str]) -> Result<(PathBuf, PathBuf), ResolveError> {
        let [package, rest @ ..] = args else {
            return Err(ResolveError::InsufficientArguments {
                path: path.to_string(),
            });
        };
        if rest.is_empty() {
            return Err(ResolveError::InsufficientArguments {
                path: path.to_string(),
            });
        }

        let base = self
            .lookup
            .resolve(package)
            .ok_or_else(|| ResolveError::PackageNotFound {
                package: (*package).to_string(),
            })?;

        let target = rest.iter().fold(base.clone(), |acc, segment| acc.join(segment));
        Ok((base, target))
    }
}

/// Check containment, then read the whole file. The handle is dropped as
/// soon as the read finishes, before the response is built.
async fn read_package_file(
    path: &str,
    base: &Path,
    target: &Path,
) -> Result<Resolution, ResolveError> {
    let not_found = || ResolveError::FileNotFound {
        path: path.to_string(),
        target: target.to_path_buf(),
    };

    let base = tokio::fs::canonicalize(base).await.map_err(|_| not_found())?;
    let canonical = tokio::fs::canonicalize(target)
        .await
        .map_err(|_| not_found())?;
    if !canonical.starts_with(&base) {
        return Err(ResolveError::OutsidePackage {
            path: path.to_string(),
            target: canonical,
        });
    }

    let file = tokio::fs::File::open(&canonical)
        .await
        .map_err(|_| not_found())?;
    let metadata = file
        .metadata()
        .await
        .map_err(|source| ResolveError::GenericIo {
            path: path.to_string(),
            source,
        })?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let body = read_body(path, file, metadata.len()).await?;
    Ok(Resolution::File {
        target: canonical,
        body,
    })
}

/// Read `reader` to the end and release it
async fn read_body<R>(path: &str, mut reader: R, size_hint: u64) -> Result<Bytes, ResolveError>
where
    R: AsyncRead + Unpin,
{
    let mut contents = Vec::with_capacity(usize::try_from(size_hint).unwrap_or(0));
    reader
        .read_to_end(&mut contents)
        .await
        .map_err(|source| ResolveError::GenericIo {
            path: path.to_string(),
            source,
        })?;
    drop(reader);
    Ok(Bytes::from(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::StaticLookup;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::fs;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    /// Yields `good` bytes, then fails like a disk read error
    struct FailingReader {
        good: Vec<u8>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.good.is_empty() {
                return Poll::Ready(Err(io::Error::other("input/output error")));
            }
            let chunk = std::mem::take(&mut self.good);
            buf.put_slice(&chunk);
            Poll::Ready(Ok(()))
        }
    }

    /// Package `foo` with `meshes/box.dae` (512 bytes) and `urdf/robot.urdf`
    fn fixture() -> (TempDir, Resolver, Vec<u8>) {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("foo");
        fs::create_dir_all(pkg.join("meshes")).unwrap();
        fs::create_dir_all(pkg.join("urdf")).unwrap();

        let mesh: Vec<u8> = (0..512u32).map(|i| (i % 251) as u8).collect();
        fs::write(pkg.join("meshes/box.dae"), &mesh).unwrap();
        fs::write(pkg.join("urdf/robot.urdf"), "<robot name=\"r\"/>").unwrap();
        fs::write(dir.path().join("secret.txt"), "outside").unwrap();

        let lookup = StaticLookup::new().with_package("foo", &pkg);
        (dir, Resolver::new(Arc::new(lookup)), mesh)
    }

    #[tokio::test]
    async fn test_serves_package_file() {
        let (_dir, resolver, mesh) = fixture();
        match resolver.resolve("/PKG/foo/meshes/box.dae").await.unwrap() {
            Resolution::File { target, body } => {
                assert_eq!(body.len(), 512);
                assert_eq!(body.as_ref(), mesh.as_slice());
                assert!(target.ends_with("meshes/box.dae"));
            }
            Resolution::Empty => panic!("Expected File"),
        }
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let (_dir, resolver, _) = fixture();
        let first = resolver.resolve("/PKG/foo/urdf/robot.urdf").await.unwrap();
        let second = resolver.resolve("/PKG/foo/urdf/robot.urdf").await.unwrap();
        match (first, second) {
            (Resolution::File { body: a, .. }, Resolution::File { body: b, .. }) => {
                assert_eq!(a, b);
            }
            _ => panic!("Expected File twice"),
        }
    }

    #[tokio::test]
    async fn test_unknown_package() {
        let (_dir, resolver, _) = fixture();
        let err = resolver.resolve("/PKG/bar/meshes/box.dae").await.unwrap_err();
        assert!(matches!(err, ResolveError::PackageNotFound { ref package } if package == "bar"));
        assert!(err.to_string().contains("bar"));
    }

    #[tokio::test]
    async fn test_insufficient_arguments() {
        let (_dir, resolver, _) = fixture();
        for path in ["/PKG", "/PKG/", "/PKG/foo", "/PKG/foo/"] {
            let err = resolver.resolve(path).await.unwrap_err();
            assert!(
                matches!(err, ResolveError::InsufficientArguments { .. }),
                "{path}: {err:?}"
            );
            assert!(err.to_string().starts_with("Not enough information supplied"));
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, resolver, _) = fixture();
        let err = resolver.resolve("/PKG/foo/meshes/missing.dae").await.unwrap_err();
        assert!(matches!(err, ResolveError::FileNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Requested file not found: /PKG/foo/meshes/missing.dae"
        );
    }

    #[tokio::test]
    async fn test_read_failure_is_generic_io() {
        let reader = FailingReader {
            good: b"<COLLADA>".to_vec(),
        };
        let err = read_body("/PKG/foo/meshes/box.dae", reader, 512)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::GenericIo { .. }), "{err:?}");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "File Not Found: /PKG/foo/meshes/box.dae");
        assert_eq!(err.kind(), "io_failure");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "input/output error");

        let response = crate::http::build_error_response(err.status(), &err.to_string());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"File Not Found: /PKG/foo/meshes/box.dae");
    }

    #[tokio::test]
    async fn test_read_body_returns_everything() {
        let body = read_body("/PKG/foo/a", &b"0123456789"[..], 0).await.unwrap();
        assert_eq!(body.as_ref(), b"0123456789");
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let (_dir, resolver, _) = fixture();
        let err = resolver.resolve("/PKG/foo/meshes").await.unwrap_err();
        assert!(matches!(err, ResolveError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_traversal_is_refused() {
        let (_dir, resolver, _) = fixture();
        let err = resolver.resolve("/PKG/foo/../secret.txt").await.unwrap_err();
        assert!(matches!(err, ResolveError::OutsidePackage { .. }), "{err:?}");
        assert!(err.to_string().starts_with("Requested file not found"));
    }

    #[tokio::test]
    async fn test_dot_segments_inside_package_are_allowed() {
        let (_dir, resolver, _) = fixture();
        let resolution = resolver
            .resolve("/PKG/foo/urdf/../meshes/./box.dae")
            .await
            .unwrap();
        assert!(matches!(resolution, Resolution::File { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_package_is_refused() {
        let (dir, resolver, _) = fixture();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            dir.path().join("foo/meshes/link.dae"),
        )
        .unwrap();
        let err = resolver.resolve("/PKG/foo/meshes/link.dae").await.unwrap_err();
        assert!(matches!(err, ResolveError::OutsidePackage { .. }));
    }

    #[tokio::test]
    async fn test_missing_package_directory() {
        let dir = TempDir::new().unwrap();
        let lookup = StaticLookup::new().with_package("ghost", dir.path().join("gone"));
        let resolver = Resolver::new(Arc::new(lookup));
        let err = resolver.resolve("/PKG/ghost/a.dae").await.unwrap_err();
        assert!(matches!(err, ResolveError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_node_is_a_no_op() {
        let (_dir, resolver, _) = fixture();
        assert!(matches!(
            resolver.resolve("/NODE/anything").await.unwrap(),
            Resolution::Empty
        ));
        assert!(matches!(resolver.resolve("/NODE").await.unwrap(), Resolution::Empty));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (_dir, resolver, _) = fixture();
        for path in ["/", "/favicon.ico", "/pkg/foo/meshes/box.dae"] {
            let err = resolver.resolve(path).await.unwrap_err();
            assert!(matches!(err, ResolveError::UnknownRoute { .. }), "{path}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let (dir, resolver, mesh) = fixture();
        let resolver = Arc::new(resolver);
        let urdf = fs::read(dir.path().join("foo/urdf/robot.urdf")).unwrap();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let resolver = Arc::clone(&resolver);
            let (path, expected) = if i % 2 == 0 {
                ("/PKG/foo/meshes/box.dae", mesh.clone())
            } else {
                ("/PKG/foo/urdf/robot.urdf", urdf.clone())
            };
            tasks.push(tokio::spawn(async move {
                match resolver.resolve(path).await.unwrap() {
                    Resolution::File { body, .. } => {
                        assert_eq!(body.as_ref(), expected.as_slice());
                    }
                    Resolution::Empty => panic!("Expected File"),
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }
}

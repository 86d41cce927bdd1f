//! Request handler module
//!
//! Resolves `/PKG/<package>/<subpath...>` to a file inside the package and
//! answers `/NODE/...` with an empty success. Everything else is a 404.

pub mod command;
pub mod error;
pub mod resolver;
pub mod router;

pub use error::ResolveError;
pub use resolver::{Resolution, Resolver};
pub use router::handle_request;

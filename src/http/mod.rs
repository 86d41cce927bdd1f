//! HTTP protocol layer module
//!
//! Response builders, decoupled from request resolution.

pub mod response;

pub use response::{
    build_405_response, build_empty_response, build_error_response, build_file_response,
};

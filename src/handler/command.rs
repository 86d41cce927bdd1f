//! Request path parsing
//!
//! `/PKG/foo/meshes/box.dae` parses to verb `Pkg` with arguments
//! `["foo", "meshes", "box.dae"]`. Empty segments from leading, trailing or
//! doubled separators are dropped.

/// First path segment, selecting the handling branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Serve a file from a named package
    Pkg,
    /// Reserved for launching pipeline nodes; currently a no-op
    Node,
}

impl Verb {
    /// Case-sensitive: `pkg` is not a verb
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "PKG" => Some(Self::Pkg),
            "NODE" => Some(Self::Node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub verb: Verb,
    pub args: Vec<&'a str>,
}

impl<'a> Command<'a> {
    /// Parse a request path. `None` when the path is empty or its first
    /// segment is not a known verb.
    pub fn parse(path: &'a str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let verb = Verb::from_segment(segments.next()?)?;
        Some(Self {
            verb,
            args: segments.collect(),
        })
    }
}

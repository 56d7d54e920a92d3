//! Dotted path parsing and tree resolution.
//!
//! A path is an ordered list of segments. Parsing `server.ports.0` yields
//! `Key("server")`, `Key("ports")`, `Index(0)`: tokens made only of ASCII
//! digits are list indices, everything else is a level key. Callers that
//! need to address a numeric-looking key build the path explicitly:
//!
//! ```
//! use dataio_core::{data_path, path::PathSegment};
//!
//! let slot: usize = 2;
//! let p = data_path!("robots", slot, "name");
//! assert_eq!(p.segments()[1], PathSegment::Index(2));
//! assert_eq!(p.to_string(), "robots.2.name");
//! ```
//!
//! Resolution never creates nodes. An empty segment (from a leading,
//! trailing or doubled `.`) never matches anything.

use std::fmt;

use crate::MAX_PATH_LENGTH;
use crate::error::{DataError, Result};
use crate::node::{DataNode, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Key into a Level.
    Key(String),
    /// Position in a List.
    Index(usize),
}

impl PathSegment {
    /// Classifies one dotted-path token.
    pub fn parse(token: &str) -> Self {
        if !token.is_empty()
            && token.bytes().all(|b| b.is_ascii_digit())
            && let Ok(idx) = token.parse::<usize>()
        {
            return PathSegment::Index(idx);
        }
        PathSegment::Key(token.to_string())
    }

    /// Kind of container this segment can step into.
    pub fn container_kind(&self) -> NodeKind {
        match self {
            PathSegment::Key(_) => NodeKind::Level,
            PathSegment::Index(_) => NodeKind::List,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        PathSegment::Key(key.clone())
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// Parsed path. The empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<PathSegment>,
}

impl DataPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted string. Fails only when it exceeds `MAX_PATH_LENGTH` bytes.
    pub fn parse(input: &str) -> Result<Self> {
        check_length(input.len())?;
        if input.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self {
            segments: input.split('.').map(PathSegment::parse).collect(),
        })
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    pub fn join(&self, other: &DataPath) -> DataPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        DataPath { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path without its last segment; `None` for the root path.
    pub fn parent(&self) -> Option<DataPath> {
        let (_, prefix) = self.segments.split_last()?;
        Some(DataPath {
            segments: prefix.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Byte length of the dotted rendering.
    pub fn rendered_len(&self) -> usize {
        self.to_string().len()
    }

    pub fn lookup<'a>(&self, root: &'a DataNode) -> Result<&'a DataNode> {
        walk(&self.segments, root)
    }

    pub fn lookup_mut<'a>(&self, root: &'a mut DataNode) -> Result<&'a mut DataNode> {
        walk_mut(&self.segments, root)
    }

    pub fn resolve<'a>(&self, root: &'a DataNode) -> Option<&'a DataNode> {
        self.lookup(root).ok()
    }

    pub fn resolve_mut<'a>(&self, root: &'a mut DataNode) -> Option<&'a mut DataNode> {
        self.lookup_mut(root).ok()
    }

    /// Resolves the parent of the last segment and hands back that segment,
    /// i.e. the container a write to this path lands in.
    pub fn lookup_for_write<'a, 'p>(
        &'p self,
        root: &'a mut DataNode,
    ) -> Result<(&'a mut DataNode, &'p PathSegment)> {
        let (last, prefix) = self
            .segments
            .split_last()
            .ok_or_else(|| DataError::PathNotFound(String::new()))?;
        Ok((walk_mut(prefix, root)?, last))
    }

    pub fn resolve_for_write<'a, 'p>(
        &'p self,
        root: &'a mut DataNode,
    ) -> Option<(&'a mut DataNode, &'p PathSegment)> {
        self.lookup_for_write(root).ok()
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.segments))
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for DataPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        DataPath::from_segments(iter)
    }
}

/// Anything usable as a path argument: dotted strings or prebuilt `DataPath`s.
pub trait ToPath {
    fn to_path(&self) -> Result<DataPath>;
}

impl ToPath for str {
    fn to_path(&self) -> Result<DataPath> {
        DataPath::parse(self)
    }
}

impl ToPath for String {
    fn to_path(&self) -> Result<DataPath> {
        DataPath::parse(self)
    }
}

impl ToPath for DataPath {
    fn to_path(&self) -> Result<DataPath> {
        check_length(self.rendered_len())?;
        Ok(self.clone())
    }
}

impl<T: ToPath + ?Sized> ToPath for &T {
    fn to_path(&self) -> Result<DataPath> {
        (**self).to_path()
    }
}

/// Builds a `DataPath` from string keys and `usize` indices.
#[macro_export]
macro_rules! data_path {
    () => {
        $crate::path::DataPath::root()
    };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::DataPath::from_segments([$($crate::path::PathSegment::from($seg)),+])
    };
}

fn check_length(len: usize) -> Result<()> {
    if len > MAX_PATH_LENGTH {
        return Err(DataError::PathTooLong {
            len,
            max: MAX_PATH_LENGTH,
        });
    }
    Ok(())
}

fn render(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&seg.to_string());
    }
    out
}

fn not_found(segments: &[PathSegment], depth: usize) -> DataError {
    DataError::PathNotFound(render(&segments[..=depth]))
}

fn mismatch(segments: &[PathSegment], depth: usize, node: &DataNode) -> DataError {
    DataError::TypeMismatch {
        path: render(&segments[..=depth]),
        expected: segments[depth].container_kind(),
        found: node.kind(),
    }
}

fn walk<'a>(segments: &[PathSegment], root: &'a DataNode) -> Result<&'a DataNode> {
    let mut cur = root;
    for (depth, seg) in segments.iter().enumerate() {
        if let PathSegment::Key(key) = seg
            && key.is_empty()
        {
            return Err(not_found(segments, depth));
        }
        cur = match (cur, seg) {
            (DataNode::Level(level), PathSegment::Key(key)) => level
                .get(key)
                .ok_or_else(|| not_found(segments, depth))?,
            (DataNode::List(items), PathSegment::Index(idx)) => items
                .get(*idx)
                .ok_or_else(|| not_found(segments, depth))?,
            (node, _) => return Err(mismatch(segments, depth, node)),
        };
    }
    Ok(cur)
}

fn walk_mut<'a>(segments: &[PathSegment], root: &'a mut DataNode) -> Result<&'a mut DataNode> {
    let mut cur = root;
    for (depth, seg) in segments.iter().enumerate() {
        if let PathSegment::Key(key) = seg
            && key.is_empty()
        {
            return Err(not_found(segments, depth));
        }
        cur = match (cur, seg) {
            (DataNode::Level(level), PathSegment::Key(key)) => level
                .get_mut(key)
                .ok_or_else(|| not_found(segments, depth))?,
            (DataNode::List(items), PathSegment::Index(idx)) => items
                .get_mut(*idx)
                .ok_or_else(|| not_found(segments, depth))?,
            (node, _) => return Err(mismatch(segments, depth, node)),
        };
    }
    Ok(cur)
}

// Recursive data tree and its in-place mutation primitives.
// - `DataNode` is exactly one of Scalar / List / Level; the root owns everything below it.
// - Mutations take an optional key: `Some("a.b")` places at a path whose prefix must
//   already exist, `None` appends to `self`, which must be a List.
// - Structural failures collapse to `None`/`false`; `try_insert` keeps the reason.
use std::fmt;

use tracing::{debug, trace, warn};

use crate::MAX_VALUE_LENGTH;
use crate::error::{DataError, Result};
use crate::path::{DataPath, PathSegment, ToPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Number,
    String,
    Boolean,
    List,
    Level,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Boolean => "boolean",
            NodeKind::List => "list",
            NodeKind::Level => "level",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{:?}", s),
            Scalar::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Keyed nesting level. Keys are unique and keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    members: Vec<(String, DataNode)>,
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DataNode> {
        self.members.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DataNode> {
        self.members
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces `key`. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, node: DataNode) -> &mut DataNode {
        let key = key.into();
        let idx = match self.members.iter().position(|(k, _)| *k == key) {
            Some(idx) => {
                self.members[idx].1 = node;
                idx
            }
            None => {
                self.members.push((key, node));
                self.members.len() - 1
            }
        };
        &mut self.members[idx].1
    }

    pub fn remove(&mut self, key: &str) -> Option<DataNode> {
        let idx = self.members.iter().position(|(k, _)| k == key)?;
        Some(self.members.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataNode)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, DataNode)> for Level {
    fn from_iter<I: IntoIterator<Item = (K, DataNode)>>(iter: I) -> Self {
        let mut level = Level::new();
        for (k, v) in iter {
            level.insert(k, v);
        }
        level
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataNode {
    Scalar(Scalar),
    List(Vec<DataNode>),
    Level(Level),
}

impl Default for DataNode {
    fn default() -> Self {
        DataNode::level()
    }
}

impl From<f64> for DataNode {
    fn from(n: f64) -> Self {
        DataNode::number(n)
    }
}

impl From<bool> for DataNode {
    fn from(b: bool) -> Self {
        DataNode::boolean(b)
    }
}

impl From<Level> for DataNode {
    fn from(level: Level) -> Self {
        DataNode::Level(level)
    }
}

impl From<Vec<DataNode>> for DataNode {
    fn from(items: Vec<DataNode>) -> Self {
        DataNode::List(items)
    }
}

impl DataNode {
    pub fn level() -> Self {
        DataNode::Level(Level::new())
    }

    pub fn list() -> Self {
        DataNode::List(Vec::new())
    }

    pub fn number(n: f64) -> Self {
        DataNode::Scalar(Scalar::Number(n))
    }

    pub fn boolean(b: bool) -> Self {
        DataNode::Scalar(Scalar::Boolean(b))
    }

    /// String scalar; fails if the UTF-8 payload exceeds `MAX_VALUE_LENGTH - 1` bytes.
    pub fn string(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let len = value.len();
        if len >= MAX_VALUE_LENGTH {
            return Err(DataError::ValueTooLong {
                len,
                max: MAX_VALUE_LENGTH - 1,
            });
        }
        Ok(DataNode::Scalar(Scalar::String(value)))
    }

    /// String scalar cut down to the value limit at a char boundary. Used when
    /// loading foreign data.
    pub fn string_truncated(value: &str) -> Self {
        let len = value.len();
        if len < MAX_VALUE_LENGTH {
            return DataNode::Scalar(Scalar::String(value.to_string()));
        }
        let mut end = MAX_VALUE_LENGTH - 1;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        warn!(len, kept = end, "truncating string value");
        DataNode::Scalar(Scalar::String(value[..end].to_string()))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            DataNode::Scalar(Scalar::Number(_)) => NodeKind::Number,
            DataNode::Scalar(Scalar::String(_)) => NodeKind::String,
            DataNode::Scalar(Scalar::Boolean(_)) => NodeKind::Boolean,
            DataNode::List(_) => NodeKind::List,
            DataNode::Level(_) => NodeKind::Level,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataNode::Scalar(Scalar::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataNode::Scalar(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DataNode]> {
        match self {
            DataNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<DataNode>> {
        match self {
            DataNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<&Level> {
        match self {
            DataNode::Level(level) => Some(level),
            _ => None,
        }
    }

    pub fn as_level_mut(&mut self) -> Option<&mut Level> {
        match self {
            DataNode::Level(level) => Some(level),
            _ => None,
        }
    }

    /// Adds an empty List at `key`, or appends one to `self` when `key` is `None`.
    pub fn add_list(&mut self, key: Option<&str>) -> Option<&mut DataNode> {
        self.place(key, DataNode::list())
    }

    /// Adds an empty Level at `key`, or appends one to `self` when `key` is `None`.
    pub fn add_level(&mut self, key: Option<&str>) -> Option<&mut DataNode> {
        self.place(key, DataNode::level())
    }

    pub fn set_number(&mut self, key: Option<&str>, value: f64) -> bool {
        self.place(key, DataNode::number(value)).is_some()
    }

    pub fn set_string(&mut self, key: Option<&str>, value: &str) -> bool {
        match DataNode::string(value) {
            Ok(node) => self.place(key, node).is_some(),
            Err(e) => {
                debug!(key = key.unwrap_or("<append>"), error = %e, "set_string rejected");
                false
            }
        }
    }

    pub fn set_boolean(&mut self, key: Option<&str>, value: bool) -> bool {
        self.place(key, DataNode::boolean(value)).is_some()
    }

    fn place(&mut self, key: Option<&str>, node: DataNode) -> Option<&mut DataNode> {
        match self.try_insert(key, node) {
            Ok(placed) => Some(placed),
            Err(e) => {
                debug!(key = key.unwrap_or("<append>"), error = %e, "insert failed");
                None
            }
        }
    }

    /// Places `node` at `key` (replacing whatever was there) or appends it when
    /// `key` is `None`. Returns the placed node.
    pub fn try_insert(&mut self, key: Option<&str>, node: DataNode) -> Result<&mut DataNode> {
        match key {
            None => self.append(node),
            Some(key) => {
                let path = key.to_path()?;
                self.insert_at(&path, node)
            }
        }
    }

    fn append(&mut self, node: DataNode) -> Result<&mut DataNode> {
        match self {
            DataNode::List(items) => {
                items.push(node);
                let idx = items.len() - 1;
                Ok(&mut items[idx])
            }
            other => Err(DataError::TypeMismatch {
                path: String::new(),
                expected: NodeKind::List,
                found: other.kind(),
            }),
        }
    }

    /// Places `node` at `path`. The parent of the last segment must exist; a key
    /// segment inserts/replaces in a Level, an index segment replaces an
    /// existing List element.
    pub fn insert_at(&mut self, path: &DataPath, node: DataNode) -> Result<&mut DataNode> {
        let (parent, last) = path.lookup_for_write(self)?;
        if let PathSegment::Key(key) = last
            && key.is_empty()
        {
            return Err(DataError::PathNotFound(path.to_string()));
        }
        match (parent, last) {
            (DataNode::Level(level), PathSegment::Key(key)) => Ok(level.insert(key.clone(), node)),
            (DataNode::List(items), PathSegment::Index(idx)) => match items.get_mut(*idx) {
                Some(slot) => {
                    *slot = node;
                    Ok(slot)
                }
                None => Err(DataError::PathNotFound(path.to_string())),
            },
            (parent, segment) => Err(DataError::TypeMismatch {
                path: path.to_string(),
                expected: segment.container_kind(),
                found: parent.kind(),
            }),
        }
    }

    /// Detaches and returns the node at `path`. List elements after it shift down.
    pub fn remove(&mut self, path: impl ToPath) -> Option<DataNode> {
        let path = path.to_path().ok()?;
        let (parent, last) = path.resolve_for_write(self)?;
        match (parent, last) {
            (DataNode::Level(level), PathSegment::Key(key)) => level.remove(key),
            (DataNode::List(items), PathSegment::Index(idx)) if *idx < items.len() => {
                Some(items.remove(*idx))
            }
            _ => None,
        }
    }

    /// Releases the whole subtree. Same as dropping the root.
    pub fn unload(self) {
        trace!(kind = %self.kind(), "unloading data tree");
        drop(self);
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = |n: usize| -> String { " ".repeat(n) };
        match self {
            DataNode::Scalar(s) => writeln!(f, "{}", s),
            DataNode::List(items) => {
                writeln!(f, "[")?;
                for it in items {
                    write!(f, "{}", pad(indent + 2))?;
                    it.fmt_tree(f, indent + 2)?;
                }
                writeln!(f, "{}]", pad(indent))
            }
            DataNode::Level(level) => {
                writeln!(f, "{{")?;
                for (name, val) in level.iter() {
                    write!(f, "{}{}: ", pad(indent + 2), name)?;
                    val.fmt_tree(f, indent + 2)?;
                }
                writeln!(f, "{}}}", pad(indent))
            }
        }
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

// Typed read accessors over a data tree.
// The plain getters are total: a missing path and a node of the wrong kind both
// yield the caller's default. The `try_*` getters report which of the two happened.
use tracing::debug;

use crate::error::{DataError, Result};
use crate::node::{DataNode, NodeKind};
use crate::path::{DataPath, ToPath};

impl DataNode {
    /// Borrowed view of the subtree at `path`.
    pub fn get_sub(&self, path: impl ToPath) -> Option<&DataNode> {
        self.try_get_sub(path).ok()
    }

    pub fn get_sub_mut(&mut self, path: impl ToPath) -> Option<&mut DataNode> {
        let path = path.to_path().ok()?;
        path.resolve_mut(self)
    }

    pub fn try_get_sub(&self, path: impl ToPath) -> Result<&DataNode> {
        path.to_path()?.lookup(self)
    }

    pub fn try_get_number(&self, path: impl ToPath) -> Result<f64> {
        let path = path.to_path()?;
        let node = path.lookup(self)?;
        node.as_number().ok_or_else(|| mismatch(&path, node, NodeKind::Number))
    }

    pub fn try_get_string(&self, path: impl ToPath) -> Result<&str> {
        let path = path.to_path()?;
        let node = path.lookup(self)?;
        node.as_str().ok_or_else(|| mismatch(&path, node, NodeKind::String))
    }

    pub fn try_get_boolean(&self, path: impl ToPath) -> Result<bool> {
        let path = path.to_path()?;
        let node = path.lookup(self)?;
        node.as_bool().ok_or_else(|| mismatch(&path, node, NodeKind::Boolean))
    }

    pub fn get_number(&self, default: f64, path: impl ToPath) -> f64 {
        or_default(self.try_get_number(path), default)
    }

    pub fn get_string<'a>(&'a self, default: &'a str, path: impl ToPath) -> &'a str {
        or_default(self.try_get_string(path), default)
    }

    pub fn get_boolean(&self, default: bool, path: impl ToPath) -> bool {
        or_default(self.try_get_boolean(path), default)
    }

    /// Element count of the List at `path`; 0 when missing or not a List.
    pub fn get_list_size(&self, path: impl ToPath) -> usize {
        self.get_sub(path)
            .and_then(DataNode::as_list)
            .map_or(0, <[DataNode]>::len)
    }

    /// True when `path` resolves, whatever the node's kind.
    pub fn has_key(&self, path: impl ToPath) -> bool {
        self.get_sub(path).is_some()
    }
}

fn mismatch(path: &DataPath, node: &DataNode, expected: NodeKind) -> DataError {
    DataError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: node.kind(),
    }
}

fn or_default<T>(res: Result<T>, default: T) -> T {
    match res {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "query fell back to default");
            default
        }
    }
}

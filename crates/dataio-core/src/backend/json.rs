// JSON backend on serde_json (`preserve_order`, so object key order survives a round trip).
use serde_json::{Map, Number, Value};

use super::Backend;
use crate::error::{DataError, Result};
use crate::node::{DataNode, Level, Scalar};

const NAME: &str = "json";

// Largest magnitude below which every integral f64 is exact as i64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBackend;

impl Backend for JsonBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn sniff(&self, text: &str) -> bool {
        matches!(
            text.bytes().find(|b| !b.is_ascii_whitespace()),
            Some(b'{') | Some(b'[')
        )
    }

    fn parse_string(&self, text: &str) -> Result<DataNode> {
        let value: Value = serde_json::from_str(text).map_err(|e| DataError::Parse {
            backend: NAME,
            message: e.to_string(),
        })?;
        match from_json(&value) {
            Some(root @ (DataNode::Level(_) | DataNode::List(_))) => Ok(root),
            _ => Err(DataError::Parse {
                backend: NAME,
                message: "document root must be an object or array".to_string(),
            }),
        }
    }

    fn serialize(&self, data: &DataNode) -> Result<String> {
        let value = to_json(data)?;
        serde_json::to_string_pretty(&value).map_err(|e| DataError::Serialize {
            backend: NAME,
            message: e.to_string(),
        })
    }
}

/// Converts a JSON value into a tree. `null` has no counterpart and yields
/// `None`; null members and elements are dropped.
pub fn from_json(v: &Value) -> Option<DataNode> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(DataNode::boolean(*b)),
        Value::Number(n) => n.as_f64().map(DataNode::number),
        Value::String(s) => Some(DataNode::string_truncated(s)),
        Value::Array(items) => Some(DataNode::List(items.iter().filter_map(from_json).collect())),
        Value::Object(map) => Some(DataNode::Level(
            map.iter()
                .filter_map(|(k, v)| from_json(v).map(|node| (k.as_str(), node)))
                .collect::<Level>(),
        )),
    }
}

pub fn to_json(node: &DataNode) -> Result<Value> {
    match node {
        DataNode::Scalar(Scalar::Number(n)) => number_to_json(*n),
        DataNode::Scalar(Scalar::String(s)) => Ok(Value::String(s.clone())),
        DataNode::Scalar(Scalar::Boolean(b)) => Ok(Value::Bool(*b)),
        DataNode::List(items) => Ok(Value::Array(
            items.iter().map(to_json).collect::<Result<Vec<_>>>()?,
        )),
        DataNode::Level(level) => {
            let mut map = Map::with_capacity(level.len());
            for (name, val) in level.iter() {
                map.insert(name.to_string(), to_json(val)?);
            }
            Ok(Value::Object(map))
        }
    }
}

fn number_to_json(n: f64) -> Result<Value> {
    let negative_zero = n == 0.0 && n.is_sign_negative();
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT && !negative_zero {
        return Ok(Value::Number((n as i64).into()));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| DataError::Serialize {
            backend: NAME,
            message: format!("non-finite number {}", n),
        })
}

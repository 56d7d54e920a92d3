// YAML backend on serde_yaml. Mappings keep insertion order.
use serde_yaml::{Mapping, Number, Value};

use super::Backend;
use crate::error::{DataError, Result};
use crate::node::{DataNode, Level, Scalar};

const NAME: &str = "yaml";

const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlBackend;

impl Backend for YamlBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn sniff(&self, text: &str) -> bool {
        !text.trim().is_empty()
    }

    fn parse_string(&self, text: &str) -> Result<DataNode> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        match from_yaml(&value)? {
            Some(root @ (DataNode::Level(_) | DataNode::List(_))) => Ok(root),
            _ => Err(parse_error(
                "document root must be a mapping or sequence".to_string(),
            )),
        }
    }

    fn serialize(&self, data: &DataNode) -> Result<String> {
        serde_yaml::to_string(&to_yaml(data)).map_err(|e| DataError::Serialize {
            backend: NAME,
            message: e.to_string(),
        })
    }
}

fn parse_error(message: String) -> DataError {
    DataError::Parse {
        backend: NAME,
        message,
    }
}

/// Converts a YAML value into a tree; nulls are dropped like in the JSON backend.
pub fn from_yaml(v: &Value) -> Result<Option<DataNode>> {
    Ok(match v {
        Value::Null => None,
        Value::Bool(b) => Some(DataNode::boolean(*b)),
        Value::Number(n) => n.as_f64().map(DataNode::number),
        Value::String(s) => Some(DataNode::string_truncated(s)),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for it in items {
                if let Some(node) = from_yaml(it)? {
                    out.push(node);
                }
            }
            Some(DataNode::List(out))
        }
        Value::Mapping(map) => {
            let mut level = Level::new();
            for (k, val) in map {
                if let Some(node) = from_yaml(val)? {
                    level.insert(mapping_key(k)?, node);
                }
            }
            Some(DataNode::Level(level))
        }
        Value::Tagged(tagged) => from_yaml(&tagged.value)?,
    })
}

fn mapping_key(k: &Value) -> Result<String> {
    match k {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(parse_error("unsupported mapping key".to_string())),
    }
}

pub fn to_yaml(node: &DataNode) -> Value {
    match node {
        DataNode::Scalar(Scalar::Number(n)) => {
            let negative_zero = *n == 0.0 && n.is_sign_negative();
            if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT && !negative_zero {
                Value::Number(Number::from(*n as i64))
            } else {
                Value::Number(Number::from(*n))
            }
        }
        DataNode::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        DataNode::Scalar(Scalar::Boolean(b)) => Value::Bool(*b),
        DataNode::List(items) => Value::Sequence(items.iter().map(to_yaml).collect()),
        DataNode::Level(level) => {
            let mut map = Mapping::with_capacity(level.len());
            for (name, val) in level.iter() {
                map.insert(Value::String(name.to_string()), to_yaml(val));
            }
            Value::Mapping(map)
        }
    }
}

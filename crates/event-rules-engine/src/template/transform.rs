//! 类型转换注册表
//!
//! token 语法 `name(path)` 里的 `name` 在这里查找。内置转换负责比较前的
//! 类型归一（string/int/double/bool）和 URL 编码，调用方可以再注册自定义
//! 转换。查不到的名字不报错，原值原样返回。

use std::collections::HashMap;

use tracing::trace;

use crate::flatten::url_encode;
use crate::value::Value;

/// 转换函数：吃进一个值，吐出一个值，失败时把原值原样吐回，
/// 让后续的类型化比较自然落空
pub type TransformFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

pub const TRANSFORM_TO_STRING: &str = "string";
pub const TRANSFORM_TO_INT: &str = "int";
pub const TRANSFORM_TO_DOUBLE: &str = "double";
pub const TRANSFORM_TO_BOOL: &str = "bool";
pub const TRANSFORM_URL_ENCODE: &str = "urlenc";

/// 转换注册表
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// 创建带全部内置转换的注册表
    pub fn new() -> Self {
        let mut registry = Self {
            transforms: HashMap::new(),
        };
        registry.register(TRANSFORM_TO_STRING, to_string_transform);
        registry.register(TRANSFORM_TO_INT, to_int_transform);
        registry.register(TRANSFORM_TO_DOUBLE, to_double_transform);
        registry.register(TRANSFORM_TO_BOOL, to_bool_transform);
        registry.register(TRANSFORM_URL_ENCODE, url_encode_transform);
        registry
    }

    /// 注册或覆盖一个转换
    pub fn register<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transforms.insert(name.into(), Box::new(transform));
    }

    pub fn get(&self, name: &str) -> Option<&TransformFn> {
        self.transforms.get(name)
    }

    /// 应用指定转换；未注册的名字返回原值
    pub fn apply(&self, name: &str, value: Value) -> Value {
        match self.transforms.get(name) {
            Some(transform) => transform(value),
            None => {
                trace!("转换 '{}' 未注册，保留原值", name);
                value
            }
        }
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn to_string_transform(value: Value) -> Value {
    match value {
        Value::String(_) => value,
        other => Value::String(other.to_display_string()),
    }
}

fn to_int_transform(value: Value) -> Value {
    match &value {
        Value::String(s) => match s.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => value,
        },
        Value::Double(d) => Value::Int(*d as i64),
        Value::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
        _ => value,
    }
}

fn to_double_transform(value: Value) -> Value {
    match &value {
        Value::String(s) => match s.parse::<f64>() {
            Ok(d) => Value::Double(d),
            Err(_) => value,
        },
        Value::Int(i) => Value::Double(*i as f64),
        Value::Bool(b) => Value::Double(if *b { 1.0 } else { 0.0 }),
        _ => value,
    }
}

fn to_bool_transform(value: Value) -> Value {
    match &value {
        // 只认字面量 "true"，大小写敏感，其余一律为 false
        Value::String(s) => Value::Bool(s == "true"),
        Value::Int(i) => Value::Bool(*i == 1),
        Value::Double(d) => Value::Bool(*d == 1.0),
        _ => value,
    }
}

fn url_encode_transform(value: Value) -> Value {
    match &value {
        Value::String(s) => Value::String(url_encode(s)),
        _ => value,
    }
}

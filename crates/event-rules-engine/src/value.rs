//! 值模型
//!
//! 规则引擎内部统一的 JSON 值表示。条件、结果模板和上下文查找都使用同一个
//! 封闭的枚举类型，避免在消费端出现"先转型再碰运气"的写法。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 解码后的 JSON 值
///
/// 与 `serde_json::Value` 不同，整数和浮点数是两个独立的变体，
/// 类型强转规则（见 transform 模块）依赖这个区分。
/// 对象使用 `BTreeMap`，键的遍历顺序是确定的（按字典序）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// 数值统一转为 f64，整数和浮点都接受
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// 按单个路径段取子值：对象按键查找，数组按数字下标查找
    pub fn get(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(segment),
            Value::Array(arr) => {
                let index: usize = segment.parse().ok()?;
                arr.get(index)
            }
            _ => None,
        }
    }

    /// 按点号分隔的路径逐层取值，如 "order.items.0.name"
    ///
    /// 任一段缺失、或中途遇到非容器类型，返回 `None`（"不存在"），
    /// 与存在但为 `Null` 的值是两种不同的结果。
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// 模板替换使用的字符串形式
    ///
    /// 标量直接转为字符串（Null 为空串），数组和对象输出紧凑 JSON。
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.to_json_string(),
        }
    }

    /// 紧凑 JSON 序列化；容器内部的 Null 仍然输出 `null`
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Double(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

/// 可遍历的数据源
///
/// 路径解析和模板渲染对数据源保持泛化：既可以是一个普通的 `Value` 对象，
/// 也可以是携带系统 token 的 `TokenFinder`。
pub trait Traversable {
    /// 按完整路径取值；`None` 表示路径不存在
    fn get(&self, key: &str) -> Option<Value>;
}

impl Traversable for Value {
    fn get(&self, key: &str) -> Option<Value> {
        self.get_path(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        Value::from(json!({
            "event": {"type": "PURCHASE"},
            "order": {
                "amount": 1000,
                "items": [
                    {"name": "ticket", "price": 500.5},
                    {"name": "food"}
                ]
            },
            "note": null
        }))
    }

    #[test]
    fn test_get_path() {
        let v = sample();
        assert_eq!(v.get_path("event.type"), Some(&Value::from("PURCHASE")));
        assert_eq!(v.get_path("order.amount"), Some(&Value::Int(1000)));
        assert_eq!(
            v.get_path("order.items.0.name"),
            Some(&Value::from("ticket"))
        );
        assert_eq!(v.get_path("order.items.1.price"), None);
        assert_eq!(v.get_path("nonexistent"), None);
    }

    #[test]
    fn test_present_null_is_not_absent() {
        let v = sample();
        assert_eq!(v.get_path("note"), Some(&Value::Null));
        assert_eq!(v.get_path("missing"), None);
    }

    #[test]
    fn test_int_double_distinction() {
        let v = sample();
        assert_eq!(v.get_path("order.amount").unwrap().type_name(), "integer");
        assert_eq!(
            v.get_path("order.items.0.price").unwrap().type_name(),
            "double"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let v = sample();
        let json = serde_json::to_string(&v).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Null.to_display_string(), "");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::from("abc").to_display_string(), "abc");
        assert_eq!(
            Value::from(json!(["a", 1])).to_display_string(),
            r#"["a",1]"#
        );
    }

    #[test]
    fn test_traversable_impl() {
        let v = sample();
        assert_eq!(
            Traversable::get(&v, "event.type"),
            Some(Value::from("PURCHASE"))
        );
        assert_eq!(Traversable::get(&v, "event.missing"), None);
    }
}

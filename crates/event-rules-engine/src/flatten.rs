//! 数据展平与 URL 查询串工具
//!
//! 把嵌套的事件数据展平成点号分隔的单层键值表，并支持生成
//! `key=value&...` 形式的查询串（`~all_url` token 使用）。

use std::collections::BTreeMap;

use crate::value::Value;

/// 递归展平嵌套值
///
/// - 对象键直接拼接到路径上，数组下标作为数字段拼接（如 `a.d.0`）
/// - 键名里的点号不做转义，两个键展平到同一路径时后写的覆盖先写的
/// - 顶层不是容器时返回空表
pub fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut result = BTreeMap::new();
    match value {
        Value::Object(_) | Value::Array(_) => collect(value, String::new(), &mut result),
        _ => {}
    }
    result
}

fn collect(value: &Value, prefix: String, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect(child, path, out);
            }
        }
        Value::Array(arr) => {
            for (index, child) in arr.iter().enumerate() {
                let path = if prefix.is_empty() {
                    index.to_string()
                } else {
                    format!("{}.{}", prefix, index)
                };
                collect(child, path, out);
            }
        }
        _ => {
            out.insert(prefix, value.clone());
        }
    }
}

/// 将展平后的键值表转为 URL 查询串
///
/// 数组值用逗号连接，所有键值都经过百分号编码。空表返回空串。
pub fn generate_query_string(parameters: &BTreeMap<String, Value>) -> String {
    let mut pairs = Vec::with_capacity(parameters.len());
    for (key, value) in parameters {
        let rendered = match value {
            Value::Array(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_display_string(),
        };
        pairs.push(format!("{}={}", url_encode(key), url_encode(&rendered)));
    }
    pairs.join("&")
}

/// 百分号编码，保留 RFC 3986 的 unreserved 字符
pub fn url_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(*byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested() {
        let value = Value::from(json!({
            "a": {
                "b": {"c": 1},
                "d": [2, 3]
            },
            "e": "value"
        }));

        let flattened = flatten(&value);
        assert_eq!(flattened.get("a.b.c"), Some(&Value::Int(1)));
        assert_eq!(flattened.get("a.d.0"), Some(&Value::Int(2)));
        assert_eq!(flattened.get("a.d.1"), Some(&Value::Int(3)));
        assert_eq!(flattened.get("e"), Some(&Value::from("value")));
        assert_eq!(flattened.len(), 4);
    }

    #[test]
    fn test_flatten_non_container() {
        assert!(flatten(&Value::Null).is_empty());
        assert!(flatten(&Value::from("scalar")).is_empty());
    }

    #[test]
    fn test_query_string() {
        let value = Value::from(json!({
            "key1": "value 1",
            "key2": 2,
            "tags": ["a", "b"]
        }));

        let query = generate_query_string(&flatten(&value));
        assert_eq!(query, "key1=value%201&key2=2&tags.0=a&tags.1=b");
    }

    #[test]
    fn test_query_string_empty() {
        assert_eq!(generate_query_string(&BTreeMap::new()), "");
    }

    #[test]
    fn test_query_string_joins_unflattened_arrays() {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "tags".to_string(),
            Value::from(json!(["vip", "new user"])),
        );
        assert_eq!(generate_query_string(&parameters), "tags=vip%2Cnew%20user");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("abc-123_~."), "abc-123_~.");
        assert_eq!(url_encode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(url_encode("中"), "%E4%B8%AD");
    }
}

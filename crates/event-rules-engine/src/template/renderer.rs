//! 模板渲染器
//!
//! 扫描字符串里的定界 token（默认 `{%` / `%}`），逐个经路径解析器取值、
//! 可选地套用命名转换后替换。渲染是全函数：解析不到的 token 替换成空串，
//! 未闭合的 token 原样保留，永远不会失败。

use regex::Regex;

use crate::models::Consequence;
use crate::template::TransformRegistry;
use crate::value::{Traversable, Value};

const DEFAULT_LEFT_DELIMITER: &str = "{%";
const DEFAULT_RIGHT_DELIMITER: &str = "%}";

/// 模板渲染器
pub struct TemplateRenderer {
    left_delimiter: String,
    right_delimiter: String,
    /// 匹配 `name(path)` 形式的转换调用
    transform_call: Regex,
}

impl TemplateRenderer {
    pub fn new(left_delimiter: impl Into<String>, right_delimiter: impl Into<String>) -> Self {
        Self {
            left_delimiter: left_delimiter.into(),
            right_delimiter: right_delimiter.into(),
            transform_call: Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\((.+)\)$").unwrap(),
        }
    }

    /// 渲染一段模板
    ///
    /// 所有 token 都针对同一个 `data` 快照解析，token 之间不重新求值。
    pub fn render(
        &self,
        template: &str,
        data: &dyn Traversable,
        transforms: &TransformRegistry,
    ) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        loop {
            let Some(start) = rest.find(&self.left_delimiter) else {
                out.push_str(rest);
                break;
            };
            out.push_str(&rest[..start]);

            let after = &rest[start + self.left_delimiter.len()..];
            let Some(end) = after.find(&self.right_delimiter) else {
                // 未闭合的 token，剩余部分原样拷贝
                out.push_str(&rest[start..]);
                break;
            };

            let body = after[..end].trim();
            out.push_str(&self.resolve_token(body, data, transforms));
            rest = &after[end + self.right_delimiter.len()..];
        }

        out
    }

    /// 渲染一个结果模板，重写 detail 里所有字符串叶子，返回新的结果实例
    pub fn render_consequence(
        &self,
        consequence: &Consequence,
        data: &dyn Traversable,
        transforms: &TransformRegistry,
    ) -> Consequence {
        Consequence {
            id: consequence.id.clone(),
            consequence_type: consequence.consequence_type.clone(),
            detail: self.render_value(&consequence.detail, data, transforms),
        }
    }

    fn render_value(
        &self,
        value: &Value,
        data: &dyn Traversable,
        transforms: &TransformRegistry,
    ) -> Value {
        match value {
            Value::String(s) => Value::String(self.render(s, data, transforms)),
            Value::Array(arr) => Value::Array(
                arr.iter()
                    .map(|item| self.render_value(item, data, transforms))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.render_value(item, data, transforms)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_token(
        &self,
        body: &str,
        data: &dyn Traversable,
        transforms: &TransformRegistry,
    ) -> String {
        let (path, transform) = match self.transform_call.captures(body) {
            Some(caps) => {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                (inner.trim(), Some(name))
            }
            None => (body, None),
        };

        let Some(resolved) = data.get(path) else {
            return String::new();
        };
        let value = match transform {
            Some(name) => transforms.apply(name, resolved),
            None => resolved,
        };
        value.to_display_string()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER)
    }
}

//! 规则引擎外观
//!
//! 持有当前生效的规则集，对每个进来的事件跑一遍完整的
//! 评估→渲染流程。规则集整体替换，评估路径上只读。

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::context::{EvaluationContext, Event, EventHistoryStore, SharedStateAccessor};
use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::models::{Consequence, Rule};
use crate::parser::RulesParser;
use crate::template::{TemplateRenderer, TokenFinder, TransformRegistry};
use crate::value::Value;

/// 规则引擎
///
/// 与线上规则的约定保持一致：字符串比较不区分大小写，
/// 模板定界符为 `{%` / `%}`。
pub struct RulesEngine {
    name: String,
    sdk_version: String,
    rules: RwLock<Vec<Rule>>,
    transforms: TransformRegistry,
    evaluator: ConditionEvaluator,
    renderer: TemplateRenderer,
}

impl RulesEngine {
    /// 创建一个空引擎
    ///
    /// `name` 用于日志标识，`sdk_version` 是 `~sdkver` token 的取值。
    pub fn new(name: impl Into<String>, sdk_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sdk_version: sdk_version.into(),
            rules: RwLock::new(Vec::new()),
            transforms: TransformRegistry::new(),
            evaluator: ConditionEvaluator::case_insensitive(),
            renderer: TemplateRenderer::default(),
        }
    }

    /// 整体替换当前规则集
    pub fn replace_rules(&self, rules: Vec<Rule>) {
        let count = rules.len();
        *self.rules.write() = rules;
        info!("({}) 已加载 {} 条规则", self.name, count);
    }

    /// 从规则 JSON 加载并替换规则集
    ///
    /// 信封解码失败时返回错误，当前规则集保持不动。
    pub fn load_rules(&self, data: &[u8]) -> Result<usize> {
        let rules = RulesParser::parse(data).ok_or(RuleError::MalformedRuleSet)?;
        let count = rules.len();
        self.replace_rules(rules);
        Ok(count)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// 注册自定义转换，供 token 的 `name(path)` 语法使用
    pub fn register_transform<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transforms.register(name, transform);
    }

    /// 对一个事件评估全部规则，返回命中规则渲染后的 consequence 列表
    ///
    /// 每次调用构造全新的上下文和 TokenFinder，评估之间互不影响。
    /// 历史事件查询对本方法是阻塞调用，慢存储应由调用方安排线程。
    pub fn process(
        &self,
        event: &Event,
        shared_state: &dyn SharedStateAccessor,
        event_history: &dyn EventHistoryStore,
    ) -> Vec<Consequence> {
        let ctx = EvaluationContext::new(
            event,
            shared_state,
            event_history,
            &self.transforms,
            &self.sdk_version,
        );
        let finder = TokenFinder::new(&ctx);

        let rules = self.rules.read();
        let mut triggered = Vec::new();
        for rule in rules.iter() {
            if self.evaluator.evaluate(&rule.condition, &finder) {
                debug!(
                    "({}) 规则命中，渲染 {} 个 consequence",
                    self.name,
                    rule.consequences.len()
                );
                for consequence in &rule.consequences {
                    triggered.push(self.renderer.render_consequence(
                        consequence,
                        &finder,
                        &self.transforms,
                    ));
                }
            }
        }
        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryEventHistory, InMemorySharedState};
    use serde_json::json;

    const RULES_JSON: &str = r#"
    {
        "version": 1,
        "rules": [
            {
                "condition": {
                    "type": "matcher",
                    "definition": {"key": "action", "matcher": "eq", "values": ["checkout"]}
                },
                "consequences": [
                    {
                        "id": "c1",
                        "type": "url",
                        "detail": {"url": "https://example.com/?a={%action%}&v={%~sdkver%}"}
                    }
                ]
            }
        ]
    }
    "#;

    fn checkout_event() -> Event {
        Event::new(
            "test",
            "com.example.eventType.generic",
            "com.example.eventSource.requestContent",
            Value::from(json!({"action": "checkout"})),
        )
    }

    #[test]
    fn test_process_renders_matched_consequences() {
        let engine = RulesEngine::new("test-engine", "2.0.0");
        assert_eq!(engine.load_rules(RULES_JSON.as_bytes()).unwrap(), 1);

        let state = InMemorySharedState::new();
        let history = InMemoryEventHistory::new();
        let consequences = engine.process(&checkout_event(), &state, &history);

        assert_eq!(consequences.len(), 1);
        assert_eq!(
            consequences[0].detail.get_path("url"),
            Some(&Value::from("https://example.com/?a=checkout&v=2.0.0"))
        );
    }

    #[test]
    fn test_process_no_match_is_empty() {
        let engine = RulesEngine::new("test-engine", "2.0.0");
        engine.load_rules(RULES_JSON.as_bytes()).unwrap();

        let state = InMemorySharedState::new();
        let history = InMemoryEventHistory::new();
        let event = Event::new("test", "t", "s", Value::from(json!({"action": "browse"})));

        assert!(engine.process(&event, &state, &history).is_empty());
    }

    #[test]
    fn test_case_insensitive_matching() {
        let engine = RulesEngine::new("test-engine", "2.0.0");
        engine.load_rules(RULES_JSON.as_bytes()).unwrap();

        let state = InMemorySharedState::new();
        let history = InMemoryEventHistory::new();
        let event = Event::new("test", "t", "s", Value::from(json!({"action": "CHECKOUT"})));

        assert_eq!(engine.process(&event, &state, &history).len(), 1);
    }

    #[test]
    fn test_malformed_rules_keep_previous_set() {
        let engine = RulesEngine::new("test-engine", "2.0.0");
        engine.load_rules(RULES_JSON.as_bytes()).unwrap();
        assert_eq!(engine.rule_count(), 1);

        assert!(engine.load_rules(b"{ not json").is_err());
        // 解析失败不影响已加载的规则
        assert_eq!(engine.rule_count(), 1);
    }

    #[test]
    fn test_replace_rules_is_wholesale() {
        let engine = RulesEngine::new("test-engine", "2.0.0");
        engine.load_rules(RULES_JSON.as_bytes()).unwrap();
        assert_eq!(engine.rule_count(), 1);

        engine.replace_rules(Vec::new());
        assert_eq!(engine.rule_count(), 0);
    }

    #[test]
    fn test_custom_transform_in_template() {
        let mut engine = RulesEngine::new("test-engine", "2.0.0");
        engine.register_transform("upper", |value| match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        });

        let json = r#"
        {
            "version": 1,
            "rules": [
                {
                    "condition": {
                        "type": "matcher",
                        "definition": {"key": "action", "matcher": "ex"}
                    },
                    "consequences": [
                        {"id": "c1", "type": "url", "detail": {"u": "{%upper(action)%}"}}
                    ]
                }
            ]
        }
        "#;
        engine.load_rules(json.as_bytes()).unwrap();

        let state = InMemorySharedState::new();
        let history = InMemoryEventHistory::new();
        let consequences = engine.process(&checkout_event(), &state, &history);

        assert_eq!(
            consequences[0].detail.get_path("u"),
            Some(&Value::from("CHECKOUT"))
        );
    }
}

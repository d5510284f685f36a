//! 规则解析器
//!
//! 把规则 JSON 文档解码成不可变的 `Rule` 列表。解码分两步：
//! 先用 serde 映射到与 JSON 结构一一对应的镜像类型，再逐条校验
//! 判别字段并转换成领域模型。单条规则解码失败只丢弃该条并记日志，
//! 其余规则照常生效；信封本身坏掉才算整体解析失败。

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::context::EventHistoryRequest;
use crate::error::{Result, RuleError};
use crate::models::{Condition, Consequence, Operand, Rule};
use crate::operators::{ConditionOperator, EventHistorySearchType, LogicalOperator};
use crate::template::transform::{
    TRANSFORM_TO_BOOL, TRANSFORM_TO_DOUBLE, TRANSFORM_TO_INT, TRANSFORM_TO_STRING,
};
use crate::value::Value;

const CONDITION_TYPE_GROUP: &str = "group";
const CONDITION_TYPE_LOGICAL: &str = "logical";
const CONDITION_TYPE_MATCHER: &str = "matcher";
const CONDITION_TYPE_HISTORICAL: &str = "historical";

/// 与规则 JSON 逐字段对应的镜像类型
#[derive(Debug, Deserialize)]
struct JsonRuleRoot {
    version: i64,
    rules: Vec<JsonRule>,
}

#[derive(Debug, Deserialize)]
struct JsonRule {
    condition: JsonCondition,
    consequences: Vec<JsonConsequence>,
}

#[derive(Debug, Deserialize)]
struct JsonCondition {
    #[serde(rename = "type")]
    condition_type: String,
    definition: JsonDefinition,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonDefinition {
    logic: Option<String>,
    conditions: Option<Vec<JsonCondition>>,
    key: Option<String>,
    matcher: Option<String>,
    values: Option<Vec<Value>>,
    events: Option<Vec<Value>>,
    from: Option<i64>,
    to: Option<i64>,
    #[serde(rename = "searchType")]
    search_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonConsequence {
    id: Option<Value>,
    #[serde(rename = "type")]
    consequence_type: Option<Value>,
    detail: Option<Value>,
}

/// 规则解析器
pub struct RulesParser;

impl RulesParser {
    /// 解析规则 JSON 文档
    ///
    /// 信封 JSON 坏掉返回 `None`，调用方应保留已加载的规则集不动；
    /// 合法信封加空 `rules` 数组返回空列表，表示"没有配置规则"。
    pub fn parse(data: &[u8]) -> Option<Vec<Rule>> {
        let root: JsonRuleRoot = match serde_json::from_slice(data).map_err(RuleError::Json) {
            Ok(root) => root,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        debug!(
            "解析规则集 version={}，共 {} 条规则",
            root.version,
            root.rules.len()
        );

        let mut rules = Vec::with_capacity(root.rules.len());
        for (index, json_rule) in root.rules.into_iter().enumerate() {
            match convert_rule(json_rule) {
                Ok(rule) => rules.push(rule),
                // 单条规则坏掉只丢弃该条，其余规则照常生效
                Err(e) => warn!("规则 #{} 解码失败，已丢弃: {}", index, e),
            }
        }
        Some(rules)
    }

    /// 把规则集序列化回线上格式，满足 parse(serialize(rules)) == Some(rules)
    pub fn serialize(rules: &[Rule]) -> Vec<u8> {
        let rules_json: Vec<serde_json::Value> = rules
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "condition": condition_to_json(&rule.condition),
                    "consequences": rule
                        .consequences
                        .iter()
                        .map(|c| {
                            serde_json::json!({
                                "id": c.id,
                                "type": c.consequence_type,
                                "detail": c.detail,
                            })
                        })
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        let root = serde_json::json!({
            "version": 1,
            "rules": rules_json,
        });
        serde_json::to_vec(&root).unwrap_or_default()
    }
}

fn convert_rule(json: JsonRule) -> Result<Rule> {
    let condition = convert_condition(json.condition)?;

    let mut consequences = Vec::with_capacity(json.consequences.len());
    for json_consequence in json.consequences {
        match convert_consequence(json_consequence) {
            Some(consequence) => consequences.push(consequence),
            None => debug!("忽略缺少 id/type/detail 的 consequence"),
        }
    }

    Ok(Rule::new(condition, consequences))
}

fn convert_condition(json: JsonCondition) -> Result<Condition> {
    match json.condition_type.as_str() {
        CONDITION_TYPE_GROUP | CONDITION_TYPE_LOGICAL => convert_logical(json.definition),
        CONDITION_TYPE_MATCHER => convert_matcher(json.definition),
        CONDITION_TYPE_HISTORICAL => convert_historical(json.definition),
        other => Err(RuleError::UnknownConditionType(other.to_string())),
    }
}

fn convert_logical(definition: JsonDefinition) -> Result<Condition> {
    let logic = definition
        .logic
        .ok_or_else(|| RuleError::InvalidDefinition("逻辑组缺少 logic 字段".into()))?;
    let operator = LogicalOperator::from_logic_code(&logic)
        .ok_or_else(|| RuleError::InvalidDefinition(format!("未知的逻辑操作符: {}", logic)))?;
    let conditions = definition
        .conditions
        .ok_or_else(|| RuleError::InvalidDefinition("逻辑组缺少 conditions 字段".into()))?;

    let mut operands = Vec::with_capacity(conditions.len());
    for child in conditions {
        match convert_condition(child) {
            Ok(operand) => operands.push(operand),
            // 坏掉的子条件跳过；全部坏掉才算组失败
            Err(e) => warn!("逻辑组子条件解码失败，已跳过: {}", e),
        }
    }
    if operands.is_empty() {
        return Err(RuleError::EmptyLogicalGroup);
    }

    Ok(Condition::Logical { operator, operands })
}

fn convert_matcher(definition: JsonDefinition) -> Result<Condition> {
    let key = definition
        .key
        .ok_or_else(|| RuleError::InvalidDefinition("matcher 条件缺少 key 字段".into()))?;
    let matcher = definition
        .matcher
        .ok_or_else(|| RuleError::InvalidDefinition("matcher 条件缺少 matcher 字段".into()))?;
    let operator = ConditionOperator::from_matcher_code(&matcher)
        .ok_or(RuleError::UnknownMatcher(matcher))?;

    // 存在性检查不关心 values
    if operator.is_presence_check() {
        return Ok(Condition::Comparison {
            operator,
            lhs: Operand::path(key),
            rhs: Operand::literal(""),
        });
    }

    let mut values = definition.values.unwrap_or_default();
    match values.len() {
        0 => typed_comparison(&key, operator, Value::String(String::new())),
        1 => typed_comparison(&key, operator, values.remove(0)),
        _ => {
            // 多个候选值展开成 OR 组，逐个与同一 key 比较
            let mut operands = Vec::with_capacity(values.len());
            for value in values {
                match typed_comparison(&key, operator, value) {
                    Ok(comparison) => operands.push(comparison),
                    Err(e) => warn!("matcher 候选值解码失败，已跳过: {}", e),
                }
            }
            if operands.is_empty() {
                return Err(RuleError::InvalidDefinition(
                    "matcher 条件没有可用的候选值".into(),
                ));
            }
            Ok(Condition::or(operands))
        }
    }
}

/// 按字面量类型给 lhs 路径配上类型转换，保证比较在同类值之间进行
fn typed_comparison(key: &str, operator: ConditionOperator, literal: Value) -> Result<Condition> {
    let transform = match &literal {
        Value::String(_) => TRANSFORM_TO_STRING,
        Value::Int(_) => TRANSFORM_TO_INT,
        Value::Double(_) => TRANSFORM_TO_DOUBLE,
        Value::Bool(_) => TRANSFORM_TO_BOOL,
        other => {
            return Err(RuleError::InvalidDefinition(format!(
                "matcher 不支持 {} 类型的候选值",
                other.type_name()
            )));
        }
    };

    Ok(Condition::Comparison {
        operator,
        lhs: Operand::path_with_transform(key, transform),
        rhs: Operand::Literal(literal),
    })
}

fn convert_historical(definition: JsonDefinition) -> Result<Condition> {
    let events = definition
        .events
        .ok_or_else(|| RuleError::InvalidDefinition("historical 条件缺少 events 字段".into()))?;

    let search_type = match definition.search_type.as_deref() {
        None => EventHistorySearchType::Any,
        Some("any") => EventHistorySearchType::Any,
        Some("ordered") => EventHistorySearchType::Ordered,
        Some("mostRecent") => EventHistorySearchType::MostRecent,
        Some(other) => {
            // 未知检索模式回落到 any
            warn!("未知的历史检索模式 '{}'，回落到 any", other);
            EventHistorySearchType::Any
        }
    };

    let from = definition.from.and_then(DateTime::<Utc>::from_timestamp_millis);
    let to = definition.to.and_then(DateTime::<Utc>::from_timestamp_millis);

    let requests = events
        .into_iter()
        .map(|mask| EventHistoryRequest::new(mask, from, to))
        .collect();

    Ok(Condition::Historical {
        requests,
        search_type,
    })
}

fn convert_consequence(json: JsonConsequence) -> Option<Consequence> {
    let id = json.id?.as_str()?.to_string();
    let consequence_type = json.consequence_type?.as_str()?.to_string();
    let detail = json.detail?;
    // detail 必须是对象
    detail.as_object()?;

    Some(Consequence::new(id, consequence_type, detail))
}

fn condition_to_json(condition: &Condition) -> serde_json::Value {
    match condition {
        Condition::Logical { operator, operands } => serde_json::json!({
            "type": CONDITION_TYPE_GROUP,
            "definition": {
                "logic": operator.to_string(),
                "conditions": operands.iter().map(condition_to_json).collect::<Vec<_>>(),
            }
        }),
        Condition::Comparison { operator, lhs, rhs } => {
            let key = match lhs {
                Operand::Path { path, .. } => path.clone(),
                Operand::Literal(value) => value.to_display_string(),
            };
            let values = if operator.is_presence_check() {
                Vec::new()
            } else {
                match rhs {
                    Operand::Literal(value) => {
                        vec![serde_json::to_value(value).unwrap_or_default()]
                    }
                    Operand::Path { path, .. } => vec![serde_json::Value::String(path.clone())],
                }
            };
            serde_json::json!({
                "type": CONDITION_TYPE_MATCHER,
                "definition": {
                    "key": key,
                    "matcher": operator.matcher_code(),
                    "values": values,
                }
            })
        }
        Condition::Historical {
            requests,
            search_type,
        } => {
            let mut definition = serde_json::json!({
                "events": requests
                    .iter()
                    .map(|r| serde_json::to_value(&r.mask).unwrap_or_default())
                    .collect::<Vec<_>>(),
                "searchType": search_type.to_string(),
            });
            // from/to 在线上格式里对整批查询共用，取第一条的即可
            if let Some(first) = requests.first() {
                if let Some(from) = first.from {
                    definition["from"] = serde_json::json!(from.timestamp_millis());
                }
                if let Some(to) = first.to {
                    definition["to"] = serde_json::json!(to.timestamp_millis());
                }
            }
            serde_json::json!({
                "type": CONDITION_TYPE_HISTORICAL,
                "definition": definition,
            })
        }
    }
}

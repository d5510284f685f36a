//! 条件评估器
//!
//! 把一棵条件树对着评估上下文算成布尔值。评估是全函数：
//! 路径解析不到、类型不兼容、存储报错，统统退化成 false，
//! 不会让任何错误越过评估边界。

use tracing::{debug, warn};

use crate::context::EventHistoryRequest;
use crate::history::HistoricalEventMatcher;
use crate::models::{Condition, Operand};
use crate::operators::{ConditionOperator, EventHistorySearchType, LogicalOperator};
use crate::template::TokenFinder;
use crate::value::{Traversable, Value};

/// 条件评估器
///
/// `case_insensitive` 打开后字符串比较忽略大小写（equals/contains/
/// startsWith/endsWith），引擎外观默认打开。
pub struct ConditionEvaluator {
    case_insensitive: bool,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self {
            case_insensitive: false,
        }
    }

    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
        }
    }

    /// 评估一棵条件树
    pub fn evaluate(&self, condition: &Condition, finder: &TokenFinder) -> bool {
        match condition {
            Condition::Logical { operator, operands } => match operator {
                // 从左到右短路；空操作数列表是单位元：AND 为真，OR 为假
                LogicalOperator::And => operands.iter().all(|c| self.evaluate(c, finder)),
                LogicalOperator::Or => operands.iter().any(|c| self.evaluate(c, finder)),
            },
            Condition::Comparison { operator, lhs, rhs } => {
                self.evaluate_comparison(*operator, lhs, rhs, finder)
            }
            Condition::Historical {
                requests,
                search_type,
            } => self.evaluate_historical(requests, *search_type, finder),
        }
    }

    /// 解析操作数：字面量直接取值，路径经 TokenFinder 解析后套用类型转换
    fn resolve_operand(&self, operand: &Operand, finder: &TokenFinder) -> Option<Value> {
        match operand {
            Operand::Literal(value) => Some(value.clone()),
            Operand::Path { path, transform } => {
                let resolved = finder.get(path)?;
                Some(match transform {
                    Some(name) => finder.context().transforms.apply(name, resolved),
                    None => resolved,
                })
            }
        }
    }

    fn evaluate_comparison(
        &self,
        operator: ConditionOperator,
        lhs: &Operand,
        rhs: &Operand,
        finder: &TokenFinder,
    ) -> bool {
        // 存在性检查只看左值能否解析出来，存在的 Null 也算存在
        if operator.is_presence_check() {
            let present = self.resolve_operand(lhs, finder).is_some();
            return match operator {
                ConditionOperator::Exists => present,
                _ => !present,
            };
        }

        let (Some(lhs), Some(rhs)) = (
            self.resolve_operand(lhs, finder),
            self.resolve_operand(rhs, finder),
        ) else {
            return false;
        };

        match operator {
            ConditionOperator::Equals => self.values_equal(&lhs, &rhs).unwrap_or(false),
            ConditionOperator::NotEquals => self
                .values_equal(&lhs, &rhs)
                .map(|eq| !eq)
                .unwrap_or(false),
            ConditionOperator::GreaterThan => Self::numeric_compare(&lhs, &rhs, |a, b| a > b),
            ConditionOperator::GreaterEqual => Self::numeric_compare(&lhs, &rhs, |a, b| a >= b),
            ConditionOperator::LessThan => Self::numeric_compare(&lhs, &rhs, |a, b| a < b),
            ConditionOperator::LessEqual => Self::numeric_compare(&lhs, &rhs, |a, b| a <= b),
            ConditionOperator::Contains => {
                self.string_compare(&lhs, &rhs, |a, b| a.contains(b)).unwrap_or(false)
            }
            ConditionOperator::NotContains => self
                .string_compare(&lhs, &rhs, |a, b| !a.contains(b))
                .unwrap_or(false),
            ConditionOperator::StartsWith => self
                .string_compare(&lhs, &rhs, |a, b| a.starts_with(b))
                .unwrap_or(false),
            ConditionOperator::EndsWith => self
                .string_compare(&lhs, &rhs, |a, b| a.ends_with(b))
                .unwrap_or(false),
            ConditionOperator::Exists | ConditionOperator::NotExists => unreachable!(),
        }
    }

    /// 同类值相等比较；类型不可比时返回 `None`（上层落成 false）
    fn values_equal(&self, lhs: &Value, rhs: &Value) -> Option<bool> {
        // 数值统一转浮点比较，整数和浮点互比也成立
        if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
            return Some((a - b).abs() < f64::EPSILON);
        }
        match (lhs, rhs) {
            (Value::String(a), Value::String(b)) => {
                if self.case_insensitive {
                    Some(a.to_lowercase() == b.to_lowercase())
                } else {
                    Some(a == b)
                }
            }
            (Value::Bool(a), Value::Bool(b)) => Some(a == b),
            _ => None,
        }
    }

    fn numeric_compare(lhs: &Value, rhs: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
        match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => false,
        }
    }

    /// 字符串比较；任一侧不是字符串时返回 `None`
    fn string_compare(
        &self,
        lhs: &Value,
        rhs: &Value,
        cmp: impl Fn(&str, &str) -> bool,
    ) -> Option<bool> {
        let (a, b) = (lhs.as_str()?, rhs.as_str()?);
        if self.case_insensitive {
            Some(cmp(&a.to_lowercase(), &b.to_lowercase()))
        } else {
            Some(cmp(a, b))
        }
    }

    fn evaluate_historical(
        &self,
        requests: &[EventHistoryRequest],
        search_type: EventHistorySearchType,
        finder: &TokenFinder,
    ) -> bool {
        // mostRecent 返回的是下标，不构成布尔语义，条件层拒绝
        if search_type == EventHistorySearchType::MostRecent {
            warn!("历史事件条件不支持 mostRecent 模式，按不匹配处理");
            return false;
        }

        let result = HistoricalEventMatcher::match_events(
            finder.context().event_history,
            requests,
            search_type,
        );
        if result == -1 {
            debug!("历史事件存储报错，条件按不匹配处理");
            return false;
        }

        match search_type {
            EventHistorySearchType::Any => result > 0,
            EventHistorySearchType::Ordered => result == 1,
            EventHistorySearchType::MostRecent => unreachable!(),
        }
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

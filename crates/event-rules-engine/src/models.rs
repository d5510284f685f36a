//! 规则领域模型
//!
//! 解析完成的规则集是不可变的：条件树、结果模板都只读，
//! 规则更新时整体替换，不做原地修改。

use crate::context::EventHistoryRequest;
use crate::operators::{ConditionOperator, EventHistorySearchType, LogicalOperator};
use crate::value::Value;

/// 一条规则：一棵条件树加一组按序触发的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub condition: Condition,
    pub consequences: Vec<Consequence>,
}

impl Rule {
    pub fn new(condition: Condition, consequences: Vec<Consequence>) -> Self {
        Self {
            condition,
            consequences,
        }
    }
}

/// 条件树节点
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// 逻辑组，操作数从左到右短路求值
    Logical {
        operator: LogicalOperator,
        operands: Vec<Condition>,
    },
    /// 比较条件，两侧操作数先解析再按转换规则归一类型
    Comparison {
        operator: ConditionOperator,
        lhs: Operand,
        rhs: Operand,
    },
    /// 历史事件条件，委托给历史事件匹配器
    Historical {
        requests: Vec<EventHistoryRequest>,
        search_type: EventHistorySearchType,
    },
}

impl Condition {
    pub fn and(operands: Vec<Condition>) -> Self {
        Condition::Logical {
            operator: LogicalOperator::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Condition>) -> Self {
        Condition::Logical {
            operator: LogicalOperator::Or,
            operands,
        }
    }
}

/// 比较条件的操作数
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// 字面量，解析时即为最终值
    Literal(Value),
    /// 路径表达式，评估时经 TokenFinder 解析，可附带一个类型转换
    Path {
        path: String,
        transform: Option<String>,
    },
}

impl Operand {
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Operand::Path {
            path: path.into(),
            transform: None,
        }
    }

    pub fn path_with_transform(path: impl Into<String>, transform: impl Into<String>) -> Self {
        Operand::Path {
            path: path.into(),
            transform: Some(transform.into()),
        }
    }
}

/// 规则命中后要触发的结果
///
/// `detail` 是只读模板，其中的字符串叶子可以包含 `{% %}` token；
/// 渲染产生新的 detail，原模板保持不变。
#[derive(Debug, Clone, PartialEq)]
pub struct Consequence {
    pub id: String,
    pub consequence_type: String,
    pub detail: Value,
}

impl Consequence {
    pub fn new(
        id: impl Into<String>,
        consequence_type: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            id: id.into(),
            consequence_type: consequence_type.into(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_builders() {
        let cond = Condition::and(vec![
            Condition::Comparison {
                operator: ConditionOperator::Equals,
                lhs: Operand::path_with_transform("event.type", "string"),
                rhs: Operand::literal("PURCHASE"),
            },
            Condition::or(vec![]),
        ]);

        match cond {
            Condition::Logical { operator, operands } => {
                assert_eq!(operator, LogicalOperator::And);
                assert_eq!(operands.len(), 2);
            }
            _ => panic!("expected logical condition"),
        }
    }

    #[test]
    fn test_consequence_is_cloneable_template() {
        let consequence = Consequence::new(
            "c1",
            "url",
            Value::from(json!({"url": "https://example.com?k={%~cachebust%}"})),
        );
        let copy = consequence.clone();
        assert_eq!(copy, consequence);
    }
}

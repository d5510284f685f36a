//! 操作符定义
//!
//! 条件树使用的比较操作符、逻辑操作符和历史事件检索模式。
//! 比较操作符在规则 JSON 里以两字母缩写出现（eq/ne/gt/...），
//! 解析时映射到完整语义。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Exists,
    NotExists,
}

impl ConditionOperator {
    /// 从规则 JSON 的 matcher 缩写转换
    pub fn from_matcher_code(code: &str) -> Option<Self> {
        let op = match code {
            "eq" => Self::Equals,
            "ne" => Self::NotEquals,
            "gt" => Self::GreaterThan,
            "ge" => Self::GreaterEqual,
            "lt" => Self::LessThan,
            "le" => Self::LessEqual,
            "co" => Self::Contains,
            "nc" => Self::NotContains,
            "sw" => Self::StartsWith,
            "ew" => Self::EndsWith,
            "ex" => Self::Exists,
            "nx" => Self::NotExists,
            _ => return None,
        };
        Some(op)
    }

    /// 转回规则 JSON 的 matcher 缩写
    pub fn matcher_code(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "ne",
            Self::GreaterThan => "gt",
            Self::GreaterEqual => "ge",
            Self::LessThan => "lt",
            Self::LessEqual => "le",
            Self::Contains => "co",
            Self::NotContains => "nc",
            Self::StartsWith => "sw",
            Self::EndsWith => "ew",
            Self::Exists => "ex",
            Self::NotExists => "nx",
        }
    }

    /// 是否是只检查存在性的操作符（不要求右值可解析）
    pub fn is_presence_check(&self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::GreaterThan => "greaterThan",
            Self::GreaterEqual => "greaterEqual",
            Self::LessThan => "lessThan",
            Self::LessEqual => "lessEqual",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Exists => "exists",
            Self::NotExists => "notExists",
        };
        write!(f, "{}", s)
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_logic_code(code: &str) -> Option<Self> {
        match code {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
        }
    }
}

/// 历史事件检索模式
///
/// - `Any`：统计所有子查询命中的事件总数
/// - `Ordered`：所有子查询都命中视为序列成立，结果是 1/0 的布尔标志
/// - `MostRecent`：返回最近一次命中的子查询下标，不产生布尔语义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventHistorySearchType {
    Any,
    Ordered,
    MostRecent,
}

impl fmt::Display for EventHistorySearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Ordered => write!(f, "ordered"),
            Self::MostRecent => write!(f, "mostRecent"),
        }
    }
}

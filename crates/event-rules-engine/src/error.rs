//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则 JSON 解码失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("规则集信封无法解码")]
    MalformedRuleSet,

    #[error("未知的条件类型: {0}")]
    UnknownConditionType(String),

    #[error("未知的 matcher 缩写: {0}")]
    UnknownMatcher(String),

    #[error("条件定义无效: {0}")]
    InvalidDefinition(String),

    #[error("逻辑组没有可用的子条件")]
    EmptyLogicalGroup,
}

pub type Result<T> = std::result::Result<T, RuleError>;

//! 事件规则引擎
//!
//! 提供数据驱动的规则评估能力，支持：
//! - JSON 规则定义和解析（单条规则坏掉不影响其余规则）
//! - 条件树短路求值（逻辑组 / 类型化比较 / 历史事件条件）
//! - token 路径解析与模板渲染（`{% %}` 定界，支持命名转换）
//! - 历史事件多模式聚合（any / ordered / mostRecent）
//!
//! 所有外部能力（共享状态、历史事件存储）通过显式传入的
//! 能力接口提供，引擎内部没有全局可变状态。

pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod flatten;
pub mod history;
pub mod models;
pub mod operators;
pub mod parser;
pub mod template;
pub mod test_support;
pub mod value;

pub use context::{
    EvaluationContext, Event, EventHistoryRequest, EventHistoryResult, EventHistoryStore,
    SharedStateAccessor, SharedStateResult, SharedStateStatus,
};
pub use engine::RulesEngine;
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use history::HistoricalEventMatcher;
pub use models::{Condition, Consequence, Operand, Rule};
pub use operators::{ConditionOperator, EventHistorySearchType, LogicalOperator};
pub use parser::RulesParser;
pub use template::{TemplateRenderer, TokenFinder, TransformRegistry};
pub use value::{Traversable, Value};

//! 评估上下文与协作方接口
//!
//! 规则评估需要的全部外部能力都通过显式传入的上下文对象提供：
//! 触发事件、共享状态读取、历史事件查询、转换函数注册表。
//! 引擎内部没有任何进程级单例。

use chrono::{DateTime, Utc};

use crate::template::TransformRegistry;
use crate::value::Value;

/// 触发规则评估的事件
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub event_type: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    /// 事件负载，通常是 `Value::Object`；无负载时为 `Value::Null`
    pub data: Value,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            name: name.into(),
            event_type: event_type.into(),
            source: source.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// 共享状态的可用性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedStateStatus {
    Set,
    Pending,
    None,
}

/// 一次共享状态查询的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SharedStateResult {
    pub status: SharedStateStatus,
    pub value: Option<Value>,
}

impl SharedStateResult {
    pub fn new(status: SharedStateStatus, value: Option<Value>) -> Self {
        Self { status, value }
    }
}

/// 按扩展名读取共享状态的能力，由宿主提供
pub trait SharedStateAccessor {
    /// 返回 `None` 表示该扩展从未注册过共享状态
    fn get_shared_state(&self, extension_name: &str) -> Option<SharedStateResult>;
}

/// 一条历史事件查询
#[derive(Debug, Clone, PartialEq)]
pub struct EventHistoryRequest {
    /// 事件数据掩码，按键值对匹配历史事件
    pub mask: Value,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EventHistoryRequest {
    pub fn new(mask: Value, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { mask, from, to }
    }
}

/// 一条历史事件查询的结果
///
/// `count == -1` 表示存储层在该条查询上出错。
#[derive(Debug, Clone, PartialEq)]
pub struct EventHistoryResult {
    pub count: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl EventHistoryResult {
    pub fn new(count: i64, oldest: Option<DateTime<Utc>>, newest: Option<DateTime<Utc>>) -> Self {
        Self {
            count,
            oldest,
            newest,
        }
    }
}

/// 历史事件存储的查询能力，由宿主提供
///
/// 实现方必须保证结果与请求一一对应且顺序一致。
/// 从评估器的角度这是一次阻塞调用，慢存储应由调用方放到合适的线程上。
pub trait EventHistoryStore {
    fn query(&self, requests: &[EventHistoryRequest]) -> Vec<EventHistoryResult>;
}

/// 单次评估使用的上下文，每个事件构造一份，用完即弃
pub struct EvaluationContext<'a> {
    pub event: &'a Event,
    pub shared_state: &'a dyn SharedStateAccessor,
    pub event_history: &'a dyn EventHistoryStore,
    pub transforms: &'a TransformRegistry,
    /// 库版本串，`~sdkver` token 的取值
    pub sdk_version: &'a str,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        event: &'a Event,
        shared_state: &'a dyn SharedStateAccessor,
        event_history: &'a dyn EventHistoryStore,
        transforms: &'a TransformRegistry,
        sdk_version: &'a str,
    ) -> Self {
        Self {
            event,
            shared_state,
            event_history,
            transforms,
            sdk_version,
        }
    }
}

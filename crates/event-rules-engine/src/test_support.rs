//! 测试辅助
//!
//! 两个协作方能力的内存实现，供单元测试和集成测试使用：
//! 共享状态用哈希表模拟，历史事件存储用预置结果脚本化。

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::context::{
    EventHistoryRequest, EventHistoryResult, EventHistoryStore, SharedStateAccessor,
    SharedStateResult, SharedStateStatus,
};
use crate::value::Value;

/// 内存共享状态
#[derive(Default)]
pub struct InMemorySharedState {
    states: HashMap<String, SharedStateResult>,
}

impl InMemorySharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个已就绪的共享状态
    pub fn set(&mut self, extension_name: impl Into<String>, value: Value) {
        self.states.insert(
            extension_name.into(),
            SharedStateResult::new(SharedStateStatus::Set, Some(value)),
        );
    }

    /// 标记扩展的共享状态为待定
    pub fn set_pending(&mut self, extension_name: impl Into<String>) {
        self.states.insert(
            extension_name.into(),
            SharedStateResult::new(SharedStateStatus::Pending, None),
        );
    }
}

impl SharedStateAccessor for InMemorySharedState {
    fn get_shared_state(&self, extension_name: &str) -> Option<SharedStateResult> {
        self.states.get(extension_name).cloned()
    }
}

/// 脚本化的内存历史事件存储
///
/// `query` 固定返回预置的结果列表，并记录每次收到的请求，
/// 方便断言短路行为（存储是否被调用过）。
#[derive(Default)]
pub struct InMemoryEventHistory {
    results: Vec<EventHistoryResult>,
    recorded: Mutex<Vec<Vec<EventHistoryRequest>>>,
}

impl InMemoryEventHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<EventHistoryResult>) -> Self {
        Self {
            results,
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// 至今收到的查询批次数
    pub fn query_count(&self) -> usize {
        self.recorded.lock().len()
    }

    /// 最近一次收到的请求列表
    pub fn last_query(&self) -> Option<Vec<EventHistoryRequest>> {
        self.recorded.lock().last().cloned()
    }
}

impl EventHistoryStore for InMemoryEventHistory {
    fn query(&self, requests: &[EventHistoryRequest]) -> Vec<EventHistoryResult> {
        self.recorded.lock().push(requests.to_vec());
        self.results.clone()
    }
}

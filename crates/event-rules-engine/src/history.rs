//! 历史事件匹配器
//!
//! 把一批历史事件查询交给存储执行，再按检索模式聚合：
//! - `Any`：返回所有命中数之和
//! - `Ordered`：全部子查询命中返回 1，否则 0
//! - `MostRecent`：返回最近命中的子查询下标
//!
//! 任一子查询报错（count == -1）时统一返回 -1，由上层条件包装成 false。

use tracing::debug;

use crate::context::{EventHistoryRequest, EventHistoryStore};
use crate::operators::EventHistorySearchType;

/// 历史事件匹配器
pub struct HistoricalEventMatcher;

impl HistoricalEventMatcher {
    /// 执行一批历史事件查询并按模式聚合
    ///
    /// 空请求列表不会触发存储调用：计数类模式返回 0，下标类模式返回 -1。
    pub fn match_events(
        store: &dyn EventHistoryStore,
        requests: &[EventHistoryRequest],
        search_type: EventHistorySearchType,
    ) -> i64 {
        if requests.is_empty() {
            debug!("历史事件查询列表为空，跳过存储调用");
            return match search_type {
                EventHistorySearchType::MostRecent => -1,
                _ => 0,
            };
        }

        let results = store.query(requests);

        match search_type {
            EventHistorySearchType::Any => {
                let mut total = 0;
                for result in &results {
                    if result.count == -1 {
                        return -1;
                    }
                    total += result.count;
                }
                total
            }
            EventHistorySearchType::Ordered => {
                let mut matched = 0;
                for result in &results {
                    if result.count == -1 {
                        return -1;
                    }
                    // 任一子查询没有命中，序列即不成立
                    if result.count == 0 {
                        return 0;
                    }
                    matched = 1;
                }
                matched
            }
            EventHistorySearchType::MostRecent => {
                let mut most_recent_index: i64 = -1;
                let mut most_recent_date = None;
                for (index, result) in results.iter().enumerate() {
                    if result.count == -1 {
                        return -1;
                    }
                    let Some(newest) = result.newest else {
                        continue;
                    };
                    // 严格大于：时间戳并列时保留先出现的下标
                    if most_recent_date.is_none_or(|current| newest > current) {
                        most_recent_date = Some(newest);
                        most_recent_index = index as i64;
                    }
                }
                most_recent_index
            }
        }
    }
}

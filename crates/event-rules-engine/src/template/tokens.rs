//! 路径解析器（TokenFinder）
//!
//! 把 token 路径解析成具体的值。支持三类路径：
//! - `~` 开头的系统 token（事件类型、时间戳、随机数等）
//! - `~state.<扩展名>/<点号路径>`，读共享状态
//! - 其余一律按点号路径直接进触发事件的数据

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::trace;

use crate::context::{EvaluationContext, SharedStateStatus};
use crate::flatten::{flatten, generate_query_string};
use crate::value::{Traversable, Value};

const TOKEN_KEY_EVENT_TYPE: &str = "~type";
const TOKEN_KEY_EVENT_SOURCE: &str = "~source";
const TOKEN_KEY_TIMESTAMP_UNIX: &str = "~timestampu";
const TOKEN_KEY_TIMESTAMP_ISO8601_NO_COLON: &str = "~timestampz";
const TOKEN_KEY_TIMESTAMP_ISO8601_UTC_MILLISECONDS: &str = "~timestampp";
const TOKEN_KEY_SDK_VERSION: &str = "~sdkver";
const TOKEN_KEY_CACHEBUST: &str = "~cachebust";
const TOKEN_KEY_ALL_URL: &str = "~all_url";
const TOKEN_KEY_ALL_JSON: &str = "~all_json";
const TOKEN_KEY_SHARED_STATE_PREFIX: &str = "~state.";
const RANDOM_INT_BOUNDARY: i64 = 100_000_000;

/// 面向单次评估的路径解析器
///
/// `now` 在构造时取一次，同一次评估里所有时间戳 token 共享同一快照；
/// `~cachebust` 除外，它每次解析都重新生成。
pub struct TokenFinder<'a> {
    ctx: &'a EvaluationContext<'a>,
    now: DateTime<Utc>,
}

impl<'a> TokenFinder<'a> {
    pub fn new(ctx: &'a EvaluationContext<'a>) -> Self {
        Self {
            ctx,
            now: Utc::now(),
        }
    }

    pub fn context(&self) -> &EvaluationContext<'a> {
        self.ctx
    }

    /// `~state.<扩展名>/<点号路径>` 形式的共享状态查询
    ///
    /// 只有状态为 `Set` 且带值时才继续按路径遍历，
    /// `Pending`/`None` 或扩展未注册都解析为"不存在"。
    fn resolve_shared_state(&self, key: &str) -> Option<Value> {
        let body = &key[TOKEN_KEY_SHARED_STATE_PREFIX.len()..];
        let (extension_name, data_key) = body.split_once('/')?;

        let Some(state) = self.ctx.shared_state.get_shared_state(extension_name) else {
            trace!("扩展 [{}] 没有共享状态", extension_name);
            return None;
        };
        if state.status != SharedStateStatus::Set {
            trace!("扩展 [{}] 的共享状态还未就绪", extension_name);
            return None;
        }

        state.value?.get_path(data_key).cloned()
    }

    fn resolve_from_event_data(&self, key: &str) -> Option<Value> {
        self.ctx.event.data.get_path(key).cloned()
    }
}

impl Traversable for TokenFinder<'_> {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            TOKEN_KEY_EVENT_TYPE => Some(Value::from(self.ctx.event.event_type.as_str())),
            TOKEN_KEY_EVENT_SOURCE => Some(Value::from(self.ctx.event.source.as_str())),
            TOKEN_KEY_SDK_VERSION => Some(Value::from(self.ctx.sdk_version)),
            TOKEN_KEY_CACHEBUST => Some(Value::Int(
                rand::rng().random_range(0..RANDOM_INT_BOUNDARY),
            )),
            TOKEN_KEY_TIMESTAMP_UNIX => Some(Value::Int(self.now.timestamp())),
            TOKEN_KEY_TIMESTAMP_ISO8601_NO_COLON => Some(Value::String(
                self.now.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            )),
            TOKEN_KEY_TIMESTAMP_ISO8601_UTC_MILLISECONDS => Some(Value::String(
                self.now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            )),
            TOKEN_KEY_ALL_URL => Some(Value::String(generate_query_string(&flatten(
                &self.ctx.event.data,
            )))),
            TOKEN_KEY_ALL_JSON => {
                if self.ctx.event.data.is_null() {
                    Some(Value::String(String::new()))
                } else {
                    Some(Value::String(self.ctx.event.data.to_json_string()))
                }
            }
            _ if key.starts_with(TOKEN_KEY_SHARED_STATE_PREFIX) => self.resolve_shared_state(key),
            _ => self.resolve_from_event_data(key),
        }
    }
}

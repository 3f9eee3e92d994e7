//! NVTF Models - 安全策略管理 API 的请求/响应结构体
//!
//! 每个资源模块定义 API 结构体及其字段表，以及资源在配置中声明的键。
//! `read_*` 函数从配置记录构造请求体，`write_*` 函数把 API 响应写回配置记录。
//! 序列形态的属性（条件集合、过滤器列表等）不会被映射器自动填充，
//! 由各模块单独转换。

pub mod admission;
pub mod group;
pub mod policy;
pub mod registry;
pub mod service;
pub mod user;

use nvtf_mapper::{ApplySummary, Record, RecordStore};
use serde_json::Value;
use tracing::warn;

/// 重新导出常用类型，方便使用
pub use admission::{AdmissionRule, AdmissionRuleCriterion};
pub use group::{Group, GroupCriteria};
pub use policy::{PolicyRule, DYNAMIC_POLICY_ID};
pub use registry::Registry;
pub use service::ServiceConfig;
pub use user::User;

/// 读取序列属性；键不存在或不是序列时返回空列表
pub(crate) fn sequence_at<S: RecordStore + ?Sized>(store: &S, key: &str) -> Vec<Value> {
    match store.get(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// 尽力写入单个属性
///
/// 存储中不存在的键记入 `skipped`，写入失败记入 `failed`，都不中断调用方。
/// 同一个键在 `summary` 中只保留最终结果。
pub(crate) fn write_value<S: RecordStore + ?Sized>(
    store: &mut S,
    key: &str,
    value: Value,
    summary: &mut ApplySummary,
) {
    summary.skipped.retain(|skipped| skipped != key);
    summary.written.retain(|written| written != key);

    if store.get(key).is_none() {
        summary.skipped.push(key.to_string());
        return;
    }

    match store.set(key, value) {
        Ok(()) => summary.written.push(key.to_string()),
        Err(err) => {
            warn!(%key, error = %err, "写入属性失败");
            summary.failed.push(key.to_string());
        }
    }
}

/// 写入由记录组成的序列属性
pub(crate) fn write_records<S: RecordStore + ?Sized>(
    store: &mut S,
    key: &str,
    records: Vec<Record>,
    summary: &mut ApplySummary,
) {
    let items = records.into_iter().map(Value::Object).collect();
    write_value(store, key, Value::Array(items), summary);
}

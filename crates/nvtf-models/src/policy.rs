//! 网络规则
//!
//! 一条网络规则描述从一个组到另一个组的连接是否被允许。配置中的规则集合
//! 是记录序列，每条记录的 `policy_id` 对应请求体的 `id`，应用列表必须全部是字符串。

use nvtf_mapper::{
    impl_mapped, sequence_to_typed, ApplySummary, Mapper, Record, RecordStore, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::admission::DEFAULT_CFG_TYPE;
use crate::{sequence_at, write_records, write_value};

/// 网络规则资源在配置中声明的键
pub const POLICY_KEYS: &[&str] = &["rule", "rules_scope", "policy_ids"];

/// 待服务端分配的规则 ID
pub const DYNAMIC_POLICY_ID: i64 = -1;

/// 写回配置时不保留的请求体键
const SERVER_ONLY_KEYS: &[&str] = &["id", "created_timestamp", "last_modified_timestamp"];

/// 网络规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// 规则 ID，`DYNAMIC_POLICY_ID` 表示由服务端分配
    pub id: i64,
    /// 用户备注
    pub comment: String,
    /// 连接发起方所在的组
    pub from: String,
    /// 连接目标所在的组
    pub to: String,
    /// 端口范围，例如 `tcp/8080,udp/any`
    pub ports: String,
    /// 命中时的动作
    pub action: String,
    /// 应用协议列表
    pub applications: Vec<String>,
    /// 是否为学习得到的规则
    pub learned: bool,
    /// 是否禁用
    pub disable: bool,
    /// 优先级
    pub priority: i64,
    /// 配置范围
    pub cfg_type: String,
    pub created_timestamp: i64,
    pub last_modified_timestamp: i64,
}

impl_mapped!(PolicyRule {
    id => r#"json:"id""#,
    comment => r#"json:"comment""#,
    from => r#"json:"from""#,
    to => r#"json:"to""#,
    ports => r#"json:"ports""#,
    action => r#"json:"action""#,
    applications => r#"json:"applications""#,
    learned => r#"json:"learned""#,
    disable => r#"json:"disable""#,
    priority => r#"json:"priority""#,
    cfg_type => r#"json:"cfg_type""#,
    created_timestamp => r#"json:"created_timestamp""#,
    last_modified_timestamp => r#"json:"last_modified_timestamp""#,
});

/// 从单条规则记录构造请求体
///
/// 应用列表中出现非字符串元素时整条规则无效；缺少 `policy_id` 时使用
/// `DYNAMIC_POLICY_ID`。
pub fn read_policy_rule(mapper: &Mapper, record: &Record) -> Result<PolicyRule> {
    let mut rule: PolicyRule = mapper.record_to_struct(record)?;

    let applications = match record.get("applications") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    rule.applications = sequence_to_typed::<String>(applications)?;
    rule.id = record
        .get("policy_id")
        .and_then(Value::as_i64)
        .unwrap_or(DYNAMIC_POLICY_ID);

    if rule.cfg_type.is_empty() {
        rule.cfg_type = DEFAULT_CFG_TYPE.to_string();
    }

    Ok(rule)
}

/// 转换规则集合，丢弃无法转换的规则
pub fn read_policy_rules(mapper: &Mapper, values: &[Value]) -> Vec<PolicyRule> {
    mapper.records_to_typed_with(values, |record| read_policy_rule(mapper, record))
}

/// 从配置记录读取规则集合
pub fn read_policy<S: RecordStore + ?Sized>(mapper: &Mapper, store: &S) -> Vec<PolicyRule> {
    let rules = read_policy_rules(mapper, &sequence_at(store, "rule"));
    debug!(rules = rules.len(), "已读取网络规则");
    rules
}

/// 规则集合的作用范围；未设置时为默认范围
pub fn rules_scope<S: RecordStore + ?Sized>(store: &S) -> String {
    store
        .get_ok("rules_scope")
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CFG_TYPE.to_string())
}

/// 需要服务端分配 ID 的规则下标
pub fn dynamic_rule_indexes(rules: &[PolicyRule]) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.id == DYNAMIC_POLICY_ID)
        .map(|(index, _)| index)
        .collect()
}

/// 将单条规则转换为配置记录
///
/// 服务端维护的 ID 和时间戳不写回，ID 以 `policy_id` 保存。
pub fn policy_rule_record(mapper: &Mapper, rule: &PolicyRule) -> Result<Record> {
    let mut record = mapper.struct_to_record(rule)?;

    for key in SERVER_ONLY_KEYS {
        record.remove(*key);
    }
    record.insert("policy_id".to_string(), Value::from(rule.id));

    Ok(record)
}

/// 将规则集合写回配置记录
pub fn write_policy<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    rules: &[PolicyRule],
    store: &mut S,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    let records = mapper.typed_to_records_with(rules, |rule| policy_rule_record(mapper, rule))?;
    write_records(store, "rule", records, &mut summary);

    let ids = rules.iter().map(|rule| Value::from(rule.id)).collect();
    write_value(store, "policy_ids", Value::Array(ids), &mut summary);

    Ok(summary)
}

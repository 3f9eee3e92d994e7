//! 准入控制规则
//!
//! 准入规则由一组匹配条件组成，决定是否允许某类编排平台资源进入集群。

use nvtf_mapper::{impl_mapped, ApplySummary, Mapper, RecordStore, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{sequence_at, write_records};

/// 准入规则在配置中声明的键
pub const ADMISSION_RULE_KEYS: &[&str] = &[
    "category",
    "comment",
    "criteria",
    "disable",
    "cfg_type",
    "rule_type",
    "rule_mode",
];

/// 默认配置类型
pub const DEFAULT_CFG_TYPE: &str = "user_created";

/// 准入规则匹配条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRuleCriterion {
    /// 条件名称
    pub name: String,
    /// 比较运算符
    pub op: String,
    /// 参考值
    pub value: String,
    /// 条件类型
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub criterion_type: String,
    /// 关联的规则模板类型
    pub template_kind: Option<String>,
    /// 条件作用的资源路径
    pub path: Option<String>,
    /// 实际值的数据类型
    pub value_type: Option<String>,
}

impl_mapped!(AdmissionRuleCriterion {
    name => r#"json:"name""#,
    op => r#"json:"op""#,
    value => r#"json:"value""#,
    criterion_type => r#"json:"type,omitempty""#,
    template_kind => r#"json:"template_kind,omitempty""#,
    path => r#"json:"path,omitempty""#,
    value_type => r#"json:"value_type,omitempty""#,
});

/// 准入规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRule {
    /// 规则 ID（由服务端分配）
    pub id: i64,
    /// 编排平台类别
    pub category: String,
    /// 用户备注
    pub comment: Option<String>,
    /// 匹配条件
    pub criteria: Vec<AdmissionRuleCriterion>,
    /// 是否禁用
    pub disable: bool,
    /// 配置范围
    pub cfg_type: String,
    /// 允许或拒绝
    pub rule_type: String,
    /// 评估模式
    pub rule_mode: Option<String>,
}

impl_mapped!(AdmissionRule {
    id => r#"json:"id,omitempty""#,
    category => r#"json:"category""#,
    comment => r#"json:"comment,omitempty""#,
    criteria => r#"json:"criteria""#,
    disable => r#"json:"disable""#,
    cfg_type => r#"json:"cfg_type""#,
    rule_type => r#"json:"rule_type""#,
    rule_mode => r#"json:"rule_mode,omitempty""#,
});

/// 从配置记录构造准入规则请求体
///
/// 条件集合中无法转换的元素被丢弃。
pub fn read_admission_rule<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    store: &S,
) -> Result<AdmissionRule> {
    let mut rule: AdmissionRule = mapper.from_store(ADMISSION_RULE_KEYS, store)?;
    rule.criteria = mapper.records_to_typed(&sequence_at(store, "criteria"));

    if rule.cfg_type.is_empty() {
        rule.cfg_type = DEFAULT_CFG_TYPE.to_string();
    }

    debug!(category = %rule.category, criteria = rule.criteria.len(), "已读取准入规则");
    Ok(rule)
}

/// 将准入规则写回配置记录
pub fn write_admission_rule<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    rule: &AdmissionRule,
    store: &mut S,
) -> Result<ApplySummary> {
    let mut summary = mapper.apply_struct(rule, store)?;
    let criteria = mapper.typed_to_records(&rule.criteria)?;
    write_records(store, "criteria", criteria, &mut summary);
    Ok(summary)
}

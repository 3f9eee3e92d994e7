//! 组
//!
//! 组通过键值条件选择工作负载，是网络规则的基本作用对象。

use nvtf_mapper::{impl_mapped, ApplySummary, Mapper, RecordStore, Result};
use serde::{Deserialize, Serialize};

use crate::admission::DEFAULT_CFG_TYPE;
use crate::{sequence_at, write_records};

/// 组在配置中声明的键
pub const GROUP_KEYS: &[&str] = &["name", "criteria", "cfg_type"];

/// 组匹配条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCriteria {
    pub key: String,
    pub op: String,
    pub value: String,
}

impl_mapped!(GroupCriteria {
    key => r#"json:"key""#,
    op => r#"json:"op""#,
    value => r#"json:"value""#,
});

/// 组
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub criteria: Vec<GroupCriteria>,
    pub cfg_type: String,
}

impl_mapped!(Group {
    name => r#"json:"name""#,
    criteria => r#"json:"criteria""#,
    cfg_type => r#"json:"cfg_type,omitempty""#,
});

/// 从配置记录构造组请求体
pub fn read_group<S: RecordStore + ?Sized>(mapper: &Mapper, store: &S) -> Result<Group> {
    let mut group: Group = mapper.from_store(GROUP_KEYS, store)?;
    group.criteria = mapper.records_to_typed(&sequence_at(store, "criteria"));

    if group.cfg_type.is_empty() {
        group.cfg_type = DEFAULT_CFG_TYPE.to_string();
    }

    Ok(group)
}

/// 将组写回配置记录
pub fn write_group<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    group: &Group,
    store: &mut S,
) -> Result<ApplySummary> {
    let mut summary = mapper.apply_struct(group, store)?;
    let criteria = mapper.typed_to_records(&group.criteria)?;
    write_records(store, "criteria", criteria, &mut summary);
    Ok(summary)
}

//! 镜像仓库
//!
//! 仓库的过滤器是字符串列表，必须全部是字符串，否则整个请求体无效。

use nvtf_mapper::{impl_mapped, sequence_to_typed, ApplySummary, Mapper, RecordStore, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{sequence_at, write_value};

/// 仓库在配置中声明的键
pub const REGISTRY_KEYS: &[&str] = &[
    "name",
    "registry_type",
    "registry",
    "filters",
    "username",
    "password",
    "auth_token",
    "auth_with_token",
    "rescan_after_db_update",
    "scan_layers",
    "repo_limit",
    "tag_limit",
    "cfg_type",
];

/// 镜像仓库
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub name: String,
    pub registry_type: String,
    pub registry: String,
    pub filters: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_token: Option<String>,
    pub auth_with_token: bool,
    pub rescan_after_db_update: bool,
    pub scan_layers: bool,
    pub repo_limit: i64,
    pub tag_limit: i64,
    pub cfg_type: String,
}

impl_mapped!(Registry {
    name => r#"json:"name""#,
    registry_type => r#"json:"registry_type""#,
    registry => r#"json:"registry""#,
    filters => r#"json:"filters""#,
    username => r#"json:"username,omitempty""#,
    password => r#"json:"password,omitempty""#,
    auth_token => r#"json:"auth_token,omitempty""#,
    auth_with_token => r#"json:"auth_with_token""#,
    rescan_after_db_update => r#"json:"rescan_after_db_update""#,
    scan_layers => r#"json:"scan_layers""#,
    repo_limit => r#"json:"repo_limit""#,
    tag_limit => r#"json:"tag_limit""#,
    cfg_type => r#"json:"cfg_type,omitempty""#,
});

/// 从配置记录构造仓库请求体
pub fn read_registry<S: RecordStore + ?Sized>(mapper: &Mapper, store: &S) -> Result<Registry> {
    let filters = sequence_to_typed::<String>(&sequence_at(store, "filters"))?;

    let mut registry: Registry = mapper.from_store(REGISTRY_KEYS, store)?;
    registry.filters = filters;

    Ok(registry)
}

/// 将仓库写回配置记录
///
/// 服务端不返回密码，配置中已有的密码保持不变。
pub fn write_registry<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    registry: &Registry,
    store: &mut S,
) -> Result<ApplySummary> {
    let password = store.get("password");

    let mut summary = mapper.apply_struct(registry, store)?;

    let filters = registry.filters.iter().cloned().map(Value::String).collect();
    write_value(store, "filters", Value::Array(filters), &mut summary);

    if let Some(password) = password {
        debug!(name = %registry.name, "恢复仓库密码");
        write_value(store, "password", password, &mut summary);
    }

    Ok(summary)
}

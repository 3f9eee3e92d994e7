//! 服务配置
//!
//! 批量修改一组服务的策略模式与基线配置。

use nvtf_mapper::{impl_mapped, sequence_to_typed, Mapper, RecordStore, Result};
use serde::{Deserialize, Serialize};

use crate::sequence_at;

/// 服务配置在配置中声明的键
pub const SERVICE_CONFIG_KEYS: &[&str] =
    &["services", "policy_mode", "baseline_profile", "not_scored"];

/// 服务配置请求体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub services: Vec<String>,
    pub policy_mode: Option<String>,
    pub baseline_profile: Option<String>,
    pub not_scored: Option<bool>,
}

impl_mapped!(ServiceConfig {
    services => r#"json:"services""#,
    policy_mode => r#"json:"policy_mode,omitempty""#,
    baseline_profile => r#"json:"baseline_profile,omitempty""#,
    not_scored => r#"json:"not_scored,omitempty""#,
});

impl ServiceConfig {
    /// 撤销配置时发送的请求体
    pub fn reset(services: Vec<String>) -> Self {
        Self {
            services,
            not_scored: Some(false),
            ..Self::default()
        }
    }
}

/// 从配置记录构造服务配置请求体
pub fn read_service_config<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    store: &S,
) -> Result<ServiceConfig> {
    let mut config: ServiceConfig = mapper.from_store(SERVICE_CONFIG_KEYS, store)?;
    config.services = sequence_to_typed(&sequence_at(store, "services"))?;
    Ok(config)
}

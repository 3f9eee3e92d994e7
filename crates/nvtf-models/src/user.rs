//! 用户

use nvtf_mapper::{impl_mapped, ApplySummary, Mapper, RecordStore, Result};
use serde::{Deserialize, Serialize};

/// 用户在配置中声明的键
pub const USER_KEYS: &[&str] = &[
    "fullname",
    "server",
    "username",
    "password",
    "email",
    "role",
    "timeout",
    "locale",
    "default_password",
    "modify_password",
    "blocked_for_failed_login",
    "blocked_for_password_expired",
];

/// 默认会话超时（秒）
pub const DEFAULT_TIMEOUT: u32 = 300;

/// 用户
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub fullname: String,
    pub server: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: String,
    pub timeout: u32,
    pub locale: String,
    pub default_password: bool,
    pub modify_password: bool,
    pub blocked_for_failed_login: bool,
    pub blocked_for_password_expired: bool,
}

impl_mapped!(User {
    fullname => r#"json:"fullname""#,
    server => r#"json:"server,omitempty""#,
    username => r#"json:"username""#,
    password => r#"json:"password,omitempty""#,
    email => r#"json:"email,omitempty""#,
    role => r#"json:"role""#,
    timeout => r#"json:"timeout""#,
    locale => r#"json:"locale""#,
    default_password => r#"json:"default_password""#,
    modify_password => r#"json:"modify_password""#,
    blocked_for_failed_login => r#"json:"blocked_for_failed_login""#,
    blocked_for_password_expired => r#"json:"blocked_for_password_expired""#,
});

/// 从配置记录构造用户请求体
pub fn read_user<S: RecordStore + ?Sized>(mapper: &Mapper, store: &S) -> Result<User> {
    let mut user: User = mapper.from_store(USER_KEYS, store)?;
    if user.timeout == 0 {
        user.timeout = DEFAULT_TIMEOUT;
    }
    Ok(user)
}

/// 将用户写回配置记录
///
/// 服务端返回的用户不含密码，配置中的密码保持不变。
pub fn write_user<S: RecordStore + ?Sized>(
    mapper: &Mapper,
    user: &User,
    store: &mut S,
) -> Result<ApplySummary> {
    let mut record = mapper.struct_to_record(user)?;
    record.remove("password");
    Ok(mapper.apply_record(&record, store))
}

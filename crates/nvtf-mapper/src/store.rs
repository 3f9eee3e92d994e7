//! 外部记录存储
//!
//! 配置系统以键值记录的形式保存每个资源实例。映射器只需要两种能力：
//! 按键读取（并区分“不存在”与“空值”）和按键写入。写入是尽力而为的，
//! 部分写入失败不会回滚。

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::descriptor::{Mapped, Record};
use crate::error::{Error, Result};
use crate::mapper::Mapper;

/// 键值记录存储
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore {
    /// 读取键对应的值；键未声明或无效时返回 `None`
    fn get(&self, key: &str) -> Option<Value>;

    /// 读取键对应的值，零值视为不存在
    fn get_ok(&self, key: &str) -> Option<Value> {
        self.get(key).filter(|value| !is_zero(value))
    }

    /// 写入键对应的值
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// 值是否为其类型的零值
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// 内存中的记录存储
///
/// 只有声明过的键可以读写，未赋值的已声明键读出空值。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// 已声明的键
    declared: BTreeSet<String>,
    /// 当前值
    values: HashMap<String, Value>,
}

impl MemoryStore {
    /// 创建声明了指定键的存储
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: keys.into_iter().map(Into::into).collect(),
            values: HashMap::new(),
        }
    }

    /// 键是否已声明
    pub fn is_declared(&self, key: &str) -> bool {
        self.declared.contains(key)
    }

    /// 导出当前值
    pub fn to_record(&self) -> Record {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        if !self.is_declared(key) {
            return None;
        }
        Some(self.values.get(key).cloned().unwrap_or(Value::Null))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        if !self.is_declared(key) {
            return Err(Error::Store {
                key: key.to_string(),
                reason: "键未声明".to_string(),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// 写入结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// 已写入的键
    pub written: Vec<String>,
    /// 被跳过的键（序列值或存储中不存在的键）
    pub skipped: Vec<String>,
    /// 写入失败的键
    pub failed: Vec<String>,
}

impl ApplySummary {
    /// 是否没有写入失败
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Mapper {
    /// 将动态记录写入存储
    ///
    /// 序列值（启用 `skip_sequences` 时）和存储中不存在的键被跳过；
    /// 单个键写入失败只记录日志，不影响其余键。
    pub fn apply_record<S>(&self, record: &Record, store: &mut S) -> ApplySummary
    where
        S: RecordStore + ?Sized,
    {
        let mut summary = ApplySummary::default();

        for (key, value) in record {
            if self.config().skip_sequences && value.is_array() {
                summary.skipped.push(key.clone());
                continue;
            }

            if store.get(key).is_none() {
                summary.skipped.push(key.clone());
                continue;
            }

            match store.set(key, value.clone()) {
                Ok(()) => summary.written.push(key.clone()),
                Err(err) => {
                    warn!(%key, error = %err, "写入记录存储失败");
                    summary.failed.push(key.clone());
                }
            }
        }

        debug!(
            written = summary.written.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "记录写入完成"
        );

        summary
    }

    /// 将结构体写入存储
    pub fn apply_struct<T, S>(&self, value: &T, store: &mut S) -> Result<ApplySummary>
    where
        T: Mapped,
        S: RecordStore + ?Sized,
    {
        let record = self.struct_to_record(value)?;
        Ok(self.apply_record(&record, store))
    }

    /// 按声明的键从存储中读取结构体
    ///
    /// 零值键视为未设置，对应字段保持默认值。
    pub fn from_store<T, S>(&self, keys: &[&str], store: &S) -> Result<T>
    where
        T: Mapped,
        S: RecordStore + ?Sized,
    {
        let record: Record = keys
            .iter()
            .filter_map(|key| store.get_ok(key).map(|value| (key.to_string(), value)))
            .collect();

        self.record_to_struct(&record)
    }

    /// 结构体是否与存储中已设置的键一致
    ///
    /// 只比较 `keys` 中存储返回非零值的键，未设置的键不参与比较。
    /// 序列值（启用 `skip_sequences` 时）由调用方单独比较。
    pub fn matches_store<T, S>(&self, value: &T, keys: &[&str], store: &S) -> Result<bool>
    where
        T: Mapped,
        S: RecordStore + ?Sized,
    {
        let record = self.struct_to_record(value)?;

        for key in keys {
            let Some(expected) = store.get_ok(key) else {
                continue;
            };

            if self.config().skip_sequences && expected.is_array() {
                continue;
            }

            if record.get(*key) != Some(&expected) {
                debug!(%key, "结构体与存储不一致");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// 使用默认配置将动态记录写入存储
pub fn apply_record<S: RecordStore + ?Sized>(record: &Record, store: &mut S) -> ApplySummary {
    Mapper::default().apply_record(record, store)
}

/// 使用默认配置将结构体写入存储
pub fn apply_struct<T: Mapped, S: RecordStore + ?Sized>(
    value: &T,
    store: &mut S,
) -> Result<ApplySummary> {
    Mapper::default().apply_struct(value, store)
}

/// 使用默认配置从存储中读取结构体
pub fn from_store<T: Mapped, S: RecordStore + ?Sized>(keys: &[&str], store: &S) -> Result<T> {
    Mapper::default().from_store(keys, store)
}

/// 使用默认配置比较结构体与存储
pub fn matches_store<T: Mapped, S: RecordStore + ?Sized>(
    value: &T,
    keys: &[&str],
    store: &S,
) -> Result<bool> {
    Mapper::default().matches_store(value, keys, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use mockall::predicate::{eq, function};
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct UserBody {
        username: String,
        email: String,
        timeout: u32,
        roles: Vec<String>,
    }

    crate::impl_mapped!(UserBody {
        username => r#"json:"username""#,
        email => r#"json:"email,omitempty""#,
        timeout => r#"json:"timeout""#,
        roles => r#"json:"roles""#,
    });

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_is_zero() {
        assert!(is_zero(&json!(null)));
        assert!(is_zero(&json!(false)));
        assert!(is_zero(&json!(0)));
        assert!(is_zero(&json!("")));
        assert!(is_zero(&json!([])));
        assert!(!is_zero(&json!(0.5)));
        assert!(!is_zero(&json!("a")));
        assert!(!is_zero(&json!({"a": 1})));
    }

    #[test]
    fn test_memory_store_presence() {
        let mut store = MemoryStore::with_keys(["username", "email"]);

        assert_eq!(store.get("username"), Some(Value::Null));
        assert_eq!(store.get("unknown"), None);
        assert_eq!(store.get_ok("username"), None);

        store.set("username", json!("admin")).unwrap();
        assert_eq!(store.get_ok("username"), Some(json!("admin")));
        assert!(matches!(
            store.set("unknown", json!(1)),
            Err(Error::Store { .. })
        ));
    }

    #[test]
    fn test_apply_record_skips_sequences_and_unknown_keys() {
        let mut store = MemoryStore::with_keys(["username", "email", "roles"]);
        let input = record(json!({
            "username": "admin",
            "email": "admin@example.com",
            "roles": ["admin"],
            "extra": 1,
        }));

        let mut summary = apply_record(&input, &mut store);
        summary.written.sort();
        summary.skipped.sort();

        assert_eq!(summary.written, vec!["email", "username"]);
        assert_eq!(summary.skipped, vec!["extra", "roles"]);
        assert!(summary.is_complete());
        assert_eq!(store.get("roles"), Some(Value::Null));
    }

    #[test]
    fn test_apply_record_sequences_allowed() {
        let mut store = MemoryStore::with_keys(["roles"]);
        let mapper = Mapper::new(MapperConfig::default().with_skip_sequences(false));

        let summary = mapper.apply_record(&record(json!({"roles": ["reader"]})), &mut store);
        assert_eq!(summary.written, vec!["roles"]);
        assert_eq!(store.get("roles"), Some(json!(["reader"])));
    }

    #[test_log::test]
    fn test_apply_record_best_effort() {
        let mut store = MockRecordStore::new();
        store.expect_get().returning(|_| Some(Value::Null));
        store
            .expect_set()
            .with(eq("email"), eq(json!("a@b.c")))
            .returning(|key, _| {
                Err(Error::Store {
                    key: key.to_string(),
                    reason: "rejected".to_string(),
                })
            });
        store
            .expect_set()
            .with(eq("username"), eq(json!("admin")))
            .times(1)
            .returning(|_, _| Ok(()));

        let input = record(json!({"email": "a@b.c", "username": "admin"}));
        let summary = apply_record(&input, &mut store);

        assert_eq!(summary.written, vec!["username"]);
        assert_eq!(summary.failed, vec!["email"]);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_apply_struct() {
        let mut store = MemoryStore::with_keys(["username", "email", "timeout", "roles"]);
        let user = UserBody {
            username: "admin".to_string(),
            email: String::new(),
            timeout: 300,
            roles: vec!["admin".to_string()],
        };

        let summary = apply_struct(&user, &mut store).unwrap();
        assert_eq!(summary.written.len(), 3);
        assert_eq!(store.get("timeout"), Some(json!(300)));
        assert_eq!(store.get("roles"), Some(Value::Null));

        assert!(matches!(
            apply_struct(&"admin".to_string(), &mut store),
            Err(Error::NotAStruct(_))
        ));
    }

    #[test]
    fn test_from_store() {
        let mut store = MemoryStore::with_keys(["username", "email", "timeout", "roles"]);
        store.set("username", json!("admin")).unwrap();
        store.set("timeout", json!(0)).unwrap();
        store.set("roles", json!(["admin"])).unwrap();

        let user: UserBody =
            from_store(&["username", "email", "timeout", "roles"], &store).unwrap();

        assert_eq!(user.username, "admin");
        assert_eq!(user.email, "");
        assert_eq!(user.timeout, 0);
        // 序列字段由调用方单独填充
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_from_mock_store() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_ok()
            .with(eq("username"))
            .returning(|_| Some(json!("reader")));
        store
            .expect_get_ok()
            .with(function(|key: &str| key != "username"))
            .returning(|_| None);

        let user: UserBody = from_store(&["username", "email"], &store).unwrap();
        assert_eq!(user.username, "reader");
    }

    fn admin() -> UserBody {
        UserBody {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            timeout: 300,
            roles: vec!["admin".to_string()],
        }
    }

    #[test]
    fn test_matches_store() {
        let keys = ["username", "email", "timeout", "roles"];
        let mut store = MemoryStore::with_keys(keys);
        store.set("username", json!("admin")).unwrap();
        store.set("timeout", json!(300)).unwrap();
        store.set("roles", json!(["reader"])).unwrap();

        // `email` 未设置，`roles` 是序列，都不参与比较
        assert!(matches_store(&admin(), &keys, &store).unwrap());
        assert!(matches_store(&admin(), &[], &store).unwrap());
    }

    #[test]
    fn test_matches_store_mismatch() {
        let keys = ["username", "timeout"];
        let mut store = MemoryStore::with_keys(keys);
        store.set("username", json!("admin")).unwrap();
        store.set("timeout", json!(60)).unwrap();

        assert!(!matches_store(&admin(), &keys, &store).unwrap());
        assert!(matches_store(&admin(), &["username"], &store).unwrap());

        // 存储中有值但结构体没有对应字段
        let mut extra = MemoryStore::with_keys(["unknown"]);
        extra.set("unknown", json!("x")).unwrap();
        assert!(!matches_store(&admin(), &["unknown"], &extra).unwrap());
    }

    #[test]
    fn test_matches_store_sequences_compared() {
        let mut store = MemoryStore::with_keys(["roles"]);
        store.set("roles", json!(["reader"])).unwrap();
        let mapper = Mapper::new(MapperConfig::default().with_skip_sequences(false));

        assert!(!mapper.matches_store(&admin(), &["roles"], &store).unwrap());
        store.set("roles", json!(["admin"])).unwrap();
        assert!(mapper.matches_store(&admin(), &["roles"], &store).unwrap());
    }

    #[test]
    fn test_matches_store_not_a_struct() {
        let store = MemoryStore::with_keys(["username"]);
        assert!(matches!(
            matches_store(&7_i64, &["username"], &store),
            Err(Error::NotAStruct(_))
        ));
    }
}

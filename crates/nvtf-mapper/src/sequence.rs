//! 无类型序列的类型断言

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::type_name;

use crate::error::{Error, Result};

/// 动态值的种类名称
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 将无类型序列逐个断言为 `T`
///
/// 遇到第一个不匹配的元素立即失败，不返回已转换的部分。
pub fn sequence_to_typed<T: DeserializeOwned>(values: &[Value]) -> Result<Vec<T>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<T>(value.clone()).map_err(|_| Error::TypeAssertionFailed {
                index,
                expected: type_name::<T>(),
                found: kind_name(value),
            })
        })
        .collect()
}

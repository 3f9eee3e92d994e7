//! 错误处理模块
//!
//! 该模块提供映射器的统一错误类型。结构性错误（非结构体输入、缺少标签）
//! 表示资源定义本身有误，总是向调用方传播；字段级的查找失败只在独立调用
//! 时才会作为错误返回。

use std::io;
use thiserror::Error;

/// 映射器统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 输入类型不是结构体
    #[error("类型 {0} 不是结构体")]
    NotAStruct(&'static str),

    /// 没有字段匹配给定的标签
    #[error("结构体 {type_name} 中不存在 {namespace} 标签为 `{tag}` 的字段")]
    FieldNotFound {
        type_name: &'static str,
        namespace: String,
        tag: String,
    },

    /// 字段缺少外部键标签
    #[error("结构体 {type_name} 的字段 {field} 缺少 {namespace} 标签")]
    MissingTag {
        type_name: &'static str,
        field: &'static str,
        namespace: String,
    },

    /// 序列元素类型断言失败
    #[error("序列第 {index} 个元素类型断言失败: 期望 {expected}, 实际为 {found}")]
    TypeAssertionFailed {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// 值无法赋给字段（仅严格模式）
    #[error("无法将值赋给 {type_name}.{field}: {reason}")]
    IncompatibleValue {
        type_name: &'static str,
        field: &'static str,
        reason: String,
    },

    /// 记录存储拒绝写入
    #[error("记录存储写入失败 `{key}`: {reason}")]
    Store { key: String, reason: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// JSON 错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 映射器结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// 是否为结构性错误（资源定义错误，而不是数据问题）
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::NotAStruct(_) | Error::MissingTag { .. })
    }
}

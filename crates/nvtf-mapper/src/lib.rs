//! NVTF Mapper - 动态记录与强类型结构体之间的双向映射
//!
//! 配置系统把每个资源实例看作一条无类型的键值记录，而 API 客户端需要强类型的
//! 请求/响应结构体。该模块在两者之间转换：
//!
//! - [`record_to_struct`]：记录转结构体，忽略未匹配的键，不填充序列字段；
//! - [`struct_to_record`]：结构体转记录，所有字段都必须带有外部键标签；
//! - [`sequence_to_typed`]、[`records_to_typed`]、[`try_records_to_typed`]：序列转换；
//! - [`apply_record`]、[`apply_struct`]、[`from_store`]、[`matches_store`]：与外部记录存储交互。
//!
//! 字段表通过 [`impl_mapped!`] 宏声明，不依赖运行时反射。

pub mod config;
pub mod descriptor;
pub mod error;
pub mod mapper;
pub mod sequence;
pub mod store;
pub mod tag;

/// 重新导出常用类型，方便使用
pub use config::{MapperConfig, Mode};
pub use descriptor::{Field, FieldKind, FieldShape, Mapped, Record, Shape, TypeDescriptor};
pub use error::{Error, Result};
pub use mapper::{
    field_name_for_tag, field_name_from_json, record_to_struct, records_to_typed,
    struct_to_record, try_records_to_typed, typed_to_records, Mapper,
};
pub use sequence::sequence_to_typed;
pub use store::{
    apply_record, apply_struct, from_store, matches_store, ApplySummary, MemoryStore, RecordStore,
};

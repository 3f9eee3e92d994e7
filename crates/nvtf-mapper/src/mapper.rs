//! 结构体与动态记录之间的双向映射
//!
//! [`Mapper`] 根据字段表在 [`Record`] 与强类型结构体之间转换：
//!
//! - 结构体转记录时，每个字段都必须带有外部键标签，否则整体失败；
//! - 记录转结构体时，未匹配的键被忽略，序列字段从不自动填充，
//!   可选字段在赋值时装箱，无法装箱的值被跳过；
//! - 严格模式下，未匹配的键和不兼容的值会作为错误返回。

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{MapperConfig, Mode};
use crate::descriptor::{Field, Mapped, Record, TypeDescriptor};
use crate::error::{Error, Result};
use crate::sequence::kind_name;

/// 结构体映射器
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    config: MapperConfig,
}

impl Mapper {
    /// 使用指定配置创建映射器
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// 严格模式映射器
    pub fn strict() -> Self {
        Self::new(MapperConfig::strict())
    }

    /// 当前配置
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.config.tag_namespace
    }

    fn is_strict(&self) -> bool {
        self.config.mode == Mode::Strict
    }

    /// 查找外部键为 `tag` 的字段名
    pub fn field_name_for_tag<T: Mapped>(&self, tag: &str) -> Result<&'static str> {
        T::descriptor()
            .field_for_tag(tag, self.namespace())
            .map(Field::name)
    }

    /// 将结构体转换为动态记录
    ///
    /// 嵌套结构体保持嵌套，不做展平。
    pub fn struct_to_record<T: Mapped>(&self, value: &T) -> Result<Record> {
        let descriptor = T::descriptor();
        let namespace = self.namespace();
        let mut record = Record::new();

        for field in descriptor.fields()? {
            let key = field.key(namespace).ok_or_else(|| Error::MissingTag {
                type_name: descriptor.name(),
                field: field.name(),
                namespace: namespace.to_string(),
            })?;

            if record.contains_key(&key) {
                debug!(type_name = descriptor.name(), field = field.name(), %key, "外部键重复，保留先声明的字段");
                continue;
            }

            record.insert(key, field.read(value)?);
        }

        Ok(record)
    }

    /// 将动态记录转换为结构体
    ///
    /// 记录中缺失的键对应的字段保持默认值。
    pub fn record_to_struct<T: Mapped>(&self, record: &Record) -> Result<T> {
        let descriptor = T::descriptor();
        descriptor.fields()?;

        let mut target = T::default();

        for (key, value) in record {
            let field = match descriptor.field_for_tag(key, self.namespace()) {
                Ok(field) => field,
                Err(err) if self.is_strict() => return Err(err),
                Err(_) => {
                    debug!(type_name = descriptor.name(), %key, "记录中的键没有对应字段，已忽略");
                    continue;
                }
            };

            self.assign(&descriptor, field, &mut target, value)?;
        }

        Ok(target)
    }

    /// 给单个字段赋值，返回是否写入
    fn assign<T>(
        &self,
        descriptor: &TypeDescriptor<T>,
        field: &Field<T>,
        target: &mut T,
        value: &Value,
    ) -> Result<bool> {
        if field.kind().is_sequence() {
            debug!(type_name = descriptor.name(), field = field.name(), "跳过序列字段");
            return Ok(false);
        }

        // 空值既不装箱也不覆盖默认值
        if value.is_null() {
            return Ok(false);
        }

        match field.write(target, value.clone()) {
            Ok(()) => Ok(true),
            Err(err) if self.is_strict() => Err(Error::IncompatibleValue {
                type_name: descriptor.name(),
                field: field.name(),
                reason: err.to_string(),
            }),
            Err(err) => {
                debug!(
                    type_name = descriptor.name(),
                    field = field.name(),
                    kind = %field.kind(),
                    error = %err,
                    "值与字段类型不兼容，已跳过"
                );
                Ok(false)
            }
        }
    }

    /// 逐个转换记录序列，丢弃无法转换的元素
    pub fn records_to_typed<T: Mapped>(&self, values: &[Value]) -> Vec<T> {
        self.records_to_typed_with(values, |record| self.record_to_struct(record))
    }

    /// 使用自定义转换函数逐个转换记录序列，丢弃无法转换的元素
    pub fn records_to_typed_with<T, F>(&self, values: &[Value], mut convert: F) -> Vec<T>
    where
        F: FnMut(&Record) -> Result<T>,
    {
        let mut items = Vec::with_capacity(values.len());

        for (index, value) in values.iter().enumerate() {
            let Some(record) = value.as_object() else {
                warn!(index, found = kind_name(value), "序列元素不是记录，已丢弃");
                continue;
            };

            match convert(record) {
                Ok(item) => items.push(item),
                Err(err) => warn!(index, error = %err, "序列元素转换失败，已丢弃"),
            }
        }

        items
    }

    /// 逐个转换记录序列，任一元素失败即返回错误
    pub fn try_records_to_typed<T: Mapped>(&self, values: &[Value]) -> Result<Vec<T>> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let record = value.as_object().ok_or_else(|| Error::TypeAssertionFailed {
                    index,
                    expected: "object",
                    found: kind_name(value),
                })?;
                self.record_to_struct(record)
            })
            .collect()
    }

    /// 将结构体序列转换为记录序列
    pub fn typed_to_records<T: Mapped>(&self, items: &[T]) -> Result<Vec<Record>> {
        self.typed_to_records_with(items, |item| self.struct_to_record(item))
    }

    /// 使用自定义转换函数将结构体序列转换为记录序列，任一元素失败即返回错误
    pub fn typed_to_records_with<T, F>(&self, items: &[T], convert: F) -> Result<Vec<Record>>
    where
        F: FnMut(&T) -> Result<Record>,
    {
        items.iter().map(convert).collect()
    }
}

/// 使用默认配置查找字段名
pub fn field_name_for_tag<T: Mapped>(tag: &str, namespace: &str) -> Result<&'static str> {
    T::descriptor().field_for_tag(tag, namespace).map(Field::name)
}

/// 按 JSON 标签查找字段名
pub fn field_name_from_json<T: Mapped>(tag: &str) -> Result<&'static str> {
    field_name_for_tag::<T>(tag, crate::config::DEFAULT_TAG_NAMESPACE)
}

/// 使用默认配置将结构体转换为动态记录
pub fn struct_to_record<T: Mapped>(value: &T) -> Result<Record> {
    Mapper::default().struct_to_record(value)
}

/// 使用默认配置将动态记录转换为结构体
pub fn record_to_struct<T: Mapped>(record: &Record) -> Result<T> {
    Mapper::default().record_to_struct(record)
}

/// 使用默认配置转换记录序列，丢弃无法转换的元素
pub fn records_to_typed<T: Mapped>(values: &[Value]) -> Vec<T> {
    Mapper::default().records_to_typed(values)
}

/// 使用默认配置转换记录序列，任一元素失败即返回错误
pub fn try_records_to_typed<T: Mapped>(values: &[Value]) -> Result<Vec<T>> {
    Mapper::default().try_records_to_typed(values)
}

/// 使用默认配置将结构体序列转换为记录序列
pub fn typed_to_records<T: Mapped>(items: &[T]) -> Result<Vec<Record>> {
    Mapper::default().typed_to_records(items)
}

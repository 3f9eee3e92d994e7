//! 类型描述模块
//!
//! 映射器不依赖运行时反射，而是为每个结构体声明一张有序的字段表：
//! 每一项记录字段名、原始标签、字段形态以及读写函数。字段表通过
//! [`impl_mapped!`](crate::impl_mapped) 宏按声明顺序生成，查找时首个匹配的字段胜出。

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};
use crate::tag;

/// 动态记录：字符串键到无类型值的映射
pub type Record = serde_json::Map<String, Value>;

/// 字段形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 标量（字符串、布尔、数字或任意动态值）
    Scalar,
    /// 可选字段，赋值时需要装箱
    Optional,
    /// 序列（列表、数组、集合）
    Sequence,
    /// 映射表
    Map,
    /// 嵌套结构体
    Nested,
}

impl FieldKind {
    /// 是否为序列形态
    pub fn is_sequence(self) -> bool {
        self == FieldKind::Sequence
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::Optional => write!(f, "optional"),
            FieldKind::Sequence => write!(f, "sequence"),
            FieldKind::Map => write!(f, "map"),
            FieldKind::Nested => write!(f, "nested"),
        }
    }
}

/// 在编译期给出字段类型的形态
pub trait FieldShape {
    const KIND: FieldKind;
}

macro_rules! scalar_shape {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldShape for $ty {
                const KIND: FieldKind = FieldKind::Scalar;
            }
        )*
    };
}

scalar_shape!(
    String, bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Value,
);

impl<T> FieldShape for Option<T> {
    const KIND: FieldKind = FieldKind::Optional;
}

impl<T> FieldShape for Vec<T> {
    const KIND: FieldKind = FieldKind::Sequence;
}

impl<T, const N: usize> FieldShape for [T; N] {
    const KIND: FieldKind = FieldKind::Sequence;
}

impl<T> FieldShape for BTreeSet<T> {
    const KIND: FieldKind = FieldKind::Sequence;
}

impl<T, S> FieldShape for HashSet<T, S> {
    const KIND: FieldKind = FieldKind::Sequence;
}

impl<K, V> FieldShape for BTreeMap<K, V> {
    const KIND: FieldKind = FieldKind::Map;
}

impl<K, V, S> FieldShape for HashMap<K, V, S> {
    const KIND: FieldKind = FieldKind::Map;
}

impl FieldShape for Record {
    const KIND: FieldKind = FieldKind::Map;
}

type Getter<T> = Box<dyn Fn(&T) -> serde_json::Result<Value> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> serde_json::Result<()> + Send + Sync>;

/// 字段描述：结构体字段与外部键之间的关联
pub struct Field<T> {
    name: &'static str,
    tag: &'static str,
    kind: FieldKind,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T: 'static> Field<T> {
    /// 根据字段访问函数创建字段描述
    pub fn new<F>(
        name: &'static str,
        tag: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self
    where
        F: FieldShape + Serialize + DeserializeOwned + 'static,
    {
        Self {
            name,
            tag,
            kind: F::KIND,
            get: Box::new(move |target| serde_json::to_value(get(target))),
            set: Box::new(move |target, value| {
                // 转换成功后才覆盖原值
                *get_mut(target) = serde_json::from_value(value)?;
                Ok(())
            }),
        }
    }
}

impl<T> Field<T> {
    /// 字段名
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 原始标签
    pub fn raw_tag(&self) -> &'static str {
        self.tag
    }

    /// 字段形态
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// 指定命名空间下的完整标签值（包含选项）
    pub fn tag(&self, namespace: &str) -> Option<Cow<'static, str>> {
        tag::lookup(self.tag, namespace)
    }

    /// 指定命名空间下的外部键；标签缺失或键为空时返回 `None`
    pub fn key(&self, namespace: &str) -> Option<String> {
        let value = self.tag(namespace)?;
        let key = tag::key_of(&value);
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    /// 外部键是否与 `key` 完全相同
    pub fn matches(&self, key: &str, namespace: &str) -> bool {
        !key.is_empty()
            && self
                .tag(namespace)
                .is_some_and(|value| tag::key_of(&value) == key)
    }

    /// 读取字段内容
    pub fn read(&self, target: &T) -> serde_json::Result<Value> {
        (self.get)(target)
    }

    /// 写入字段内容
    pub fn write(&self, target: &mut T, value: Value) -> serde_json::Result<()> {
        (self.set)(target, value)
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .finish()
    }
}

/// 类型形态
#[derive(Debug)]
pub enum Shape<T> {
    /// 结构体，字段按声明顺序排列
    Struct(Vec<Field<T>>),
    /// 非结构体类型
    Opaque,
}

/// 类型描述
#[derive(Debug)]
pub struct TypeDescriptor<T> {
    name: &'static str,
    shape: Shape<T>,
}

impl<T> TypeDescriptor<T> {
    /// 创建结构体描述
    pub fn structure(name: &'static str, fields: Vec<Field<T>>) -> Self {
        Self {
            name,
            shape: Shape::Struct(fields),
        }
    }

    /// 创建非结构体描述
    pub fn opaque(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Opaque,
        }
    }

    /// 类型名
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 是否为结构体
    pub fn is_struct(&self) -> bool {
        matches!(self.shape, Shape::Struct(_))
    }

    /// 结构体字段列表
    pub fn fields(&self) -> Result<&[Field<T>]> {
        match &self.shape {
            Shape::Struct(fields) => Ok(fields),
            Shape::Opaque => Err(Error::NotAStruct(self.name)),
        }
    }

    /// 按声明顺序查找外部键为 `tag` 的第一个字段
    pub fn field_for_tag(&self, tag: &str, namespace: &str) -> Result<&Field<T>> {
        self.fields()?
            .iter()
            .find(|field| field.matches(tag, namespace))
            .ok_or_else(|| Error::FieldNotFound {
                type_name: self.name,
                namespace: namespace.to_string(),
                tag: tag.to_string(),
            })
    }
}

/// 可映射类型
///
/// 结构体通过 [`impl_mapped!`](crate::impl_mapped) 实现；基础类型的描述为
/// [`Shape::Opaque`]，对它们调用结构体专用的操作会得到 [`Error::NotAStruct`]。
pub trait Mapped: Default + Sized + 'static {
    fn descriptor() -> TypeDescriptor<Self>;
}

macro_rules! opaque_mapped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Mapped for $ty {
                fn descriptor() -> TypeDescriptor<Self> {
                    TypeDescriptor::opaque(stringify!($ty))
                }
            }
        )*
    };
}

opaque_mapped!(
    String, bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Value,
);

impl<T: 'static> Mapped for Vec<T> {
    fn descriptor() -> TypeDescriptor<Self> {
        TypeDescriptor::opaque("Vec")
    }
}

impl<T: 'static> Mapped for Option<T> {
    fn descriptor() -> TypeDescriptor<Self> {
        TypeDescriptor::opaque("Option")
    }
}

/// 为结构体生成字段表
///
/// ```ignore
/// impl_mapped!(Criterion {
///     name => r#"json:"name""#,
///     op => r#"json:"op""#,
///     value => r#"json:"value,omitempty""#,
/// });
/// ```
///
/// 结构体需实现 `Default`，字段类型需实现 `Serialize`、`Deserialize` 与
/// [`FieldShape`]。生成的实现同时让该结构体可以作为其他结构体的嵌套字段。
#[macro_export]
macro_rules! impl_mapped {
    ($ty:ident { $($field:ident => $tag:expr),* $(,)? }) => {
        impl $crate::Mapped for $ty {
            fn descriptor() -> $crate::TypeDescriptor<Self> {
                $crate::TypeDescriptor::structure(
                    stringify!($ty),
                    vec![
                        $(
                            $crate::Field::<$ty>::new(
                                stringify!($field),
                                $tag,
                                |s: &$ty| &s.$field,
                                |s: &mut $ty| &mut s.$field,
                            ),
                        )*
                    ],
                )
            }
        }

        impl $crate::FieldShape for $ty {
            const KIND: $crate::FieldKind = $crate::FieldKind::Nested;
        }
    };
}

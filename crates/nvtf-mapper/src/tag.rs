//! 结构体标签解析
//!
//! 字段标签沿用常见的结构体标签语法：若干个以空格分隔的 `key:"value"` 对，
//! 例如 `json:"name,omitempty" yaml:"name"`。值中第一个 `,` 之前的部分是外部键，
//! 其后是选项。

use std::borrow::Cow;

/// 在原始标签中查找指定命名空间的值
///
/// 标签格式错误时返回 `None`，与未声明该命名空间的效果相同。
pub fn lookup<'a>(raw: &'a str, namespace: &str) -> Option<Cow<'a, str>> {
    let mut rest = raw;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        // 命名空间名称一直延伸到 ':'，不能包含空白、引号或控制字符
        let end = rest.find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')?;
        if end == 0 || !rest[end..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..end];
        rest = &rest[end + 2..];

        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() && bytes[i] != b'"' {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }

        let quoted = &rest[..i];
        rest = &rest[i + 1..];

        if name == namespace {
            return Some(unescape(quoted));
        }
    }
}

/// 标签值中的外部键（第一个 `,` 之前的部分）
pub fn key_of(value: &str) -> &str {
    value.split(',').next().unwrap_or_default()
}

/// 标签值中的选项（第一个 `,` 之后的部分）
pub fn options(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').skip(1).filter(|opt| !opt.is_empty())
}

/// 标签值是否带有指定选项
pub fn has_option(value: &str, option: &str) -> bool {
    options(value).any(|opt| opt == option)
}

fn unescape(quoted: &str) -> Cow<'_, str> {
    if !quoted.contains('\\') {
        return Cow::Borrowed(quoted);
    }

    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

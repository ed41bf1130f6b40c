//! 記述子をXMLの要素と属性で表すための木構造。
//!
//! 各記述子は1つの[`Element`]として表され、スカラー値は属性、
//! 繰り返される項目は子要素になる。
//! 属性を読み取るメソッドはバイナリ形式と同じ値域・長さ・個数の制約を検査する。

use std::borrow::Cow;
use std::ops::RangeInclusive;

use indexmap::IndexMap;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::cursor::encode_fixed_string;
use crate::enumeration::Enumeration;

/// XMLの読み書きで発生するエラー。
#[derive(Debug, Error)]
pub enum XmlError {
    /// XMLとして不正な文字列。
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// 要素の入れ子が壊れている。
    #[error("malformed XML document: {0}")]
    Malformed(&'static str),

    /// 期待しない名前の要素。
    #[error("unexpected element <{found}>, expected <{expected}>")]
    UnexpectedElement {
        /// 期待した要素名。
        expected: &'static str,
        /// 実際の要素名。
        found: String,
    },

    /// 登録されていない要素。
    #[error("unknown element <{0}>")]
    UnknownElement(String),

    /// 必須の属性がない。
    #[error("missing attribute '{attribute}' in <{element}>")]
    MissingAttribute {
        /// 要素名。
        element: String,
        /// 属性名。
        attribute: &'static str,
    },

    /// 属性値を解釈できない。
    #[error("invalid value '{value}' for attribute '{attribute}' in <{element}>")]
    InvalidValue {
        /// 要素名。
        element: String,
        /// 属性名。
        attribute: &'static str,
        /// 属性値。
        value: String,
    },

    /// 属性値が範囲外。
    #[error("value {value} for attribute '{attribute}' in <{element}> is out of range {min}..={max}")]
    OutOfRange {
        /// 要素名。
        element: String,
        /// 属性名。
        attribute: &'static str,
        /// 属性値。
        value: u64,
        /// 最小値。
        min: u64,
        /// 最大値。
        max: u64,
    },

    /// 文字列属性の長さが不正。
    #[error("length {len} of attribute '{attribute}' in <{element}> is out of range {min}..={max}")]
    InvalidLength {
        /// 要素名。
        element: String,
        /// 属性名。
        attribute: &'static str,
        /// 実際の文字数。
        len: usize,
        /// 最小の文字数。
        min: usize,
        /// 最大の文字数。
        max: usize,
    },

    /// 子要素の数が不正。
    #[error("<{element}> must contain {min}..={max} <{child}> elements, found {count}")]
    ChildCount {
        /// 要素名。
        element: String,
        /// 子要素名。
        child: &'static str,
        /// 実際の個数。
        count: usize,
        /// 最小の個数。
        min: usize,
        /// 最大の個数。
        max: usize,
    },

    /// 要素の内容が16進数として不正。
    #[error("invalid hexadecimal content in <{0}>")]
    InvalidHex(String),
}

/// 属性として読み書きできる符号無し整数。
pub trait XmlInt: Copy + Into<u64> + TryFrom<u64> {
    /// 型の最大値。
    const MAX: u64;
}

macro_rules! impl_xml_int {
    ($($ty:ty),*) => {
        $(
            impl XmlInt for $ty {
                const MAX: u64 = <$ty>::MAX as u64;
            }
        )*
    };
}

impl_xml_int!(u8, u16, u32, u64);

/// 10進数または`0x`で始まる16進数を解釈する。
///
/// 桁区切りの`,`と`_`は無視する。
pub fn parse_int(s: &str) -> Option<u64> {
    let s = s.trim();
    let digits: Cow<str> = if s.contains([',', '_']) {
        Cow::Owned(s.chars().filter(|&c| c != ',' && c != '_').collect())
    } else {
        Cow::Borrowed(s)
    };

    match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}

/// 空白を無視しながら16進数文字列をバイト列に変換する。
///
/// 桁数が奇数の場合や16進数以外の文字を含む場合は`None`を返す。
pub fn parse_hex(s: &str) -> Option<Vec<u8>> {
    let digits = s
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }

    Some(digits.chunks_exact(2).map(|d| d[0] << 4 | d[1]).collect())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// XMLの要素。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// `name`という名前の空の要素を生成する。
    pub fn new<S: Into<String>>(name: S) -> Element {
        Element {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// 要素名を返す。
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 要素名が`name`であれば`true`を返す。大文字小文字は区別しない。
    #[inline]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// 要素名が`expected`であることを確認する。
    pub fn check_name(&self, expected: &'static str) -> Result<(), XmlError> {
        if !self.has_name(expected) {
            return Err(XmlError::UnexpectedElement {
                expected,
                found: self.name.clone(),
            });
        }
        Ok(())
    }

    /// 要素の文字列内容を返す。
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 要素の文字列内容を設定する。
    #[inline]
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }

    /// 子要素を出現順に返す。
    #[inline]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// 属性を出現順に返す。
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (&**k, &**v))
    }

    /// `name`という名前の子要素を末尾に追加し、その子要素を返す。
    pub fn add_element<S: Into<String>>(&mut self, name: S) -> &mut Element {
        self.push_child(Element::new(name))
    }

    /// `child`を末尾の子要素として追加し、その子要素を返す。
    pub fn push_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// 属性を設定する。
    pub fn set_attribute<S: Into<String>>(&mut self, name: &str, value: S) {
        self.attributes.insert(name.to_owned(), value.into());
    }

    /// 整数属性を設定する。
    ///
    /// `hex`が`true`の場合は型の幅に合わせた`0x`付きの16進数で書き込む。
    pub fn set_int_attribute<T: XmlInt>(&mut self, name: &str, value: T, hex: bool) {
        let value: u64 = value.into();
        let value = if hex {
            format!("0x{:01$X}", value, std::mem::size_of::<T>() * 2)
        } else {
            value.to_string()
        };
        self.set_attribute(name, value);
    }

    /// 真偽値属性を設定する。
    pub fn set_bool_attribute(&mut self, name: &str, value: bool) {
        self.set_attribute(name, if value { "true" } else { "false" });
    }

    /// 列挙値属性を名前で設定する。名前がない値は10進数で書き込む。
    pub fn set_enum_attribute(&mut self, names: &Enumeration, name: &str, value: u32) {
        self.set_attribute(name, names.name_or_value(value));
    }

    /// 属性値を返す。属性名の大文字小文字は区別しない。
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| &**v)
    }

    fn required(&self, name: &'static str) -> Result<&str, XmlError> {
        self.attribute(name)
            .ok_or_else(|| XmlError::MissingAttribute {
                element: self.name.clone(),
                attribute: name,
            })
    }

    /// 属性`name`の値が不正であることを表すエラーを返す。
    ///
    /// 値域の検査を属性の読み取り後に行う場合に使う。
    pub fn invalid_attribute(&self, name: &'static str) -> XmlError {
        self.invalid_value(name, self.attribute(name).unwrap_or_default())
    }

    fn invalid_value(&self, name: &'static str, value: &str) -> XmlError {
        XmlError::InvalidValue {
            element: self.name.clone(),
            attribute: name,
            value: value.to_owned(),
        }
    }

    /// 必須の文字列属性を読み取る。
    ///
    /// 文字数が`len`の範囲にない場合はエラーを返す。
    pub fn get_string(
        &self,
        name: &'static str,
        len: RangeInclusive<usize>,
    ) -> Result<String, XmlError> {
        let value = self.required(name)?;
        let count = value.chars().count();
        if !len.contains(&count) {
            return Err(XmlError::InvalidLength {
                element: self.name.clone(),
                attribute: name,
                len: count,
                min: *len.start(),
                max: *len.end(),
            });
        }
        Ok(value.to_owned())
    }

    /// 必須の固定長文字列属性を読み取る。
    ///
    /// バイナリ形式の固定長文字列と同じく、文字数が`n`でISO 8859-1で表せる文字列のみ受け付ける。
    pub fn get_fixed_string(&self, name: &'static str, n: usize) -> Result<String, XmlError> {
        let value = self.get_string(name, n..=n)?;
        if encode_fixed_string(&value, n).is_none() {
            return Err(self.invalid_value(name, &value));
        }
        Ok(value)
    }

    /// 必須の整数属性を`range`の範囲で読み取る。
    pub fn get_int_in(
        &self,
        name: &'static str,
        range: RangeInclusive<u64>,
    ) -> Result<u64, XmlError> {
        let s = self.required(name)?;
        let value = parse_int(s).ok_or_else(|| self.invalid_value(name, s))?;
        if !range.contains(&value) {
            return Err(XmlError::OutOfRange {
                element: self.name.clone(),
                attribute: name,
                value,
                min: *range.start(),
                max: *range.end(),
            });
        }
        Ok(value)
    }

    /// 必須の整数属性を型`T`の範囲で読み取る。
    pub fn get_int<T: XmlInt>(&self, name: &'static str) -> Result<T, XmlError> {
        let value = self.get_int_in(name, 0..=T::MAX)?;
        T::try_from(value).map_err(|_| self.invalid_value(name, &value.to_string()))
    }

    /// 任意の整数属性を型`T`の範囲で読み取る。属性がない場合は`default`を返す。
    pub fn get_optional_int<T: XmlInt>(&self, name: &'static str, default: T) -> Result<T, XmlError> {
        match self.attribute(name) {
            Some(_) => self.get_int(name),
            None => Ok(default),
        }
    }

    /// 必須の真偽値属性を読み取る。
    pub fn get_bool(&self, name: &'static str) -> Result<bool, XmlError> {
        let s = self.required(name)?;
        parse_bool(s).ok_or_else(|| self.invalid_value(name, s))
    }

    /// 任意の真偽値属性を読み取る。属性がない場合は`default`を返す。
    pub fn get_optional_bool(&self, name: &'static str, default: bool) -> Result<bool, XmlError> {
        match self.attribute(name) {
            Some(_) => self.get_bool(name),
            None => Ok(default),
        }
    }

    /// 必須の列挙値属性を名前または整数として`range`の範囲で読み取る。
    pub fn get_enum(
        &self,
        names: &Enumeration,
        name: &'static str,
        range: RangeInclusive<u32>,
    ) -> Result<u32, XmlError> {
        let s = self.required(name)?;
        let value = names.parse(s).ok_or_else(|| self.invalid_value(name, s))?;
        if !range.contains(&value) {
            return Err(XmlError::OutOfRange {
                element: self.name.clone(),
                attribute: name,
                value: value as u64,
                min: *range.start() as u64,
                max: *range.end() as u64,
            });
        }
        Ok(value)
    }

    /// 任意の列挙値属性を読み取る。属性がない場合は`default`を返す。
    pub fn get_optional_enum(
        &self,
        names: &Enumeration,
        name: &'static str,
        range: RangeInclusive<u32>,
        default: u32,
    ) -> Result<u32, XmlError> {
        match self.attribute(name) {
            Some(_) => self.get_enum(names, name, range),
            None => Ok(default),
        }
    }

    /// `name`という名前の子要素を`min`個以上`max`個以下で取得する。
    pub fn get_children(
        &self,
        name: &'static str,
        min: usize,
        max: usize,
    ) -> Result<Vec<&Element>, XmlError> {
        let children: Vec<&Element> = self.children.iter().filter(|e| e.has_name(name)).collect();
        if children.len() < min || children.len() > max {
            return Err(XmlError::ChildCount {
                element: self.name.clone(),
                child: name,
                count: children.len(),
                min,
                max,
            });
        }
        Ok(children)
    }

    /// XML文字列から要素を読み取る。
    ///
    /// XML宣言やコメントは無視し、ルート要素を返す。
    pub fn parse(text: &str) -> Result<Element, XmlError> {
        let mut reader = quick_xml::Reader::from_str(text);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Element::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Element::from_start(&e)?;
                    Element::attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(XmlError::Malformed("unbalanced end tag"))?;
                    Element::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    let parent = stack
                        .last_mut()
                        .ok_or(XmlError::Malformed("text outside of the root element"))?;
                    parent.text.push_str(&t.unescape()?);
                }
                Event::CData(t) => {
                    let parent = stack
                        .last_mut()
                        .ok_or(XmlError::Malformed("text outside of the root element"))?;
                    parent.text.push_str(&String::from_utf8_lossy(&t));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed("unclosed element"));
        }
        root.ok_or(XmlError::Malformed("no root element"))
    }

    fn from_start(start: &BytesStart) -> Result<Element, XmlError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.insert(key, value);
        }
        Ok(element)
    }

    fn attach(
        stack: &mut [Element],
        root: &mut Option<Element>,
        element: Element,
    ) -> Result<(), XmlError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => return Err(XmlError::Malformed("multiple root elements")),
        }
        Ok(())
    }

    /// 字下げ付きのXML文字列に変換する。
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = quick_xml::Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write(&mut writer)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    fn write(&self, writer: &mut quick_xml::Writer<Vec<u8>>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if !self.text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&self.text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

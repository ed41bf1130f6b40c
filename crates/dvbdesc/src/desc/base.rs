//! 記述子に関する基礎の型。

use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::cursor::{OutOfBounds, Reader, Writer};
use crate::display::TablesDisplay;
use crate::xml::{Element, XmlError};

use super::block::DescriptorBuf;
use super::edid::Edid;

/// 記述子の読み取りで発生するエラー。
///
/// 読み取りに失敗した記述子は無効な記述子として扱われ、途中まで読んだ値は破棄される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// データ長が足りない。
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),

    /// 読み取り後にデータが余っている。
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),

    /// フィールドの値が規定の範囲にない。
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// 拡張記述子の拡張タグが一致しない。
    #[error("extension tag mismatch: expected 0x{expected:02X}, found 0x{found:02X}")]
    ExtensionMismatch {
        /// 期待した拡張タグ。
        expected: u8,
        /// 実際の拡張タグ。
        found: u8,
    },
}

/// 記述子の書き込みで発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// 繰り返し項目の数が上限を超えている。
    #[error("too many entries: {count} (max {max})")]
    TooManyEntries {
        /// 項目数。
        count: usize,
        /// 上限。
        max: usize,
    },

    /// フィールドの値が規定の範囲にない。
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// 記述子の内容が255バイトを超える。
    #[error("payload too long: {0} bytes")]
    PayloadTooLong(usize),

    /// 無効な記述子は書き込めない。
    #[error("invalid descriptor")]
    Invalid,
}

/// 記述子を表すトレイト。
///
/// バイナリ形式とXML形式の読み書き、および表示を実装する。
/// バイナリとXMLで検査する制約（項目数の上限、値域、文字列長）は同一でなければならない。
pub trait Descriptor: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    /// この記述子の識別子。
    const EDID: Edid;

    /// XMLの要素名。
    const XML_NAME: &'static str;

    /// 表示用の名前。
    const DISPLAY_NAME: &'static str;

    /// 記述子の内容を読み取る。
    ///
    /// `r`は`descriptor_tag`と`descriptor_length`、拡張記述子では拡張タグを読み飛ばした位置にある。
    /// 読み残しの確認は呼び出し側で行う。
    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError>;

    /// 各フィールドが符号化できる値か検査する。
    ///
    /// バイナリ形式とXML形式のどちらへの変換でも、変換前に呼ばれる。
    fn validate(&self) -> Result<(), EncodeError> {
        Ok(())
    }

    /// 記述子の内容を書き込む。
    ///
    /// `descriptor_tag`と`descriptor_length`、拡張タグは呼び出し側で書き込む。
    /// [`validate`](Descriptor::validate)による検査は済んでいる。
    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError>;

    /// `root`に属性や子要素を書き込む。
    ///
    /// [`validate`](Descriptor::validate)による検査は済んでいる。
    fn build_xml(&self, root: &mut Element);

    /// 要素名を確認済みの`element`から記述子を読み取る。
    fn analyze_xml(element: &Element) -> Result<Self, XmlError>;

    /// 記述子の内容を表示する。
    ///
    /// `data`は壊れている可能性があり、解釈できない部分は16進数で表示する。
    fn display_payload(disp: &mut TablesDisplay, data: &[u8]);

    /// `data`から記述子を読み取る。
    ///
    /// `data`には`descriptor_tag`と`descriptor_length`は含まない。
    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(data);
        if let Some(expected) = Self::EDID.xtag() {
            let found = r.read_u8()?;
            if found != expected {
                return Err(DecodeError::ExtensionMismatch { expected, found });
            }
        }

        let desc = Self::read_payload(&mut r)?;
        if !r.is_empty() {
            return Err(DecodeError::TrailingBytes(r.remaining()));
        }
        Ok(desc)
    }

    /// `data`から記述子を読み取る。
    ///
    /// `data`には`descriptor_tag`と`descriptor_length`は含まない。
    /// 不正なデータの場合は`None`を返す。
    fn read(data: &[u8]) -> Option<Self> {
        match Self::decode(data) {
            Ok(desc) => Some(desc),
            Err(e) => {
                log::debug!("invalid {}: {}", Self::XML_NAME, e);
                None
            }
        }
    }

    /// `descriptor_tag`と`descriptor_length`を含むバイナリ形式に変換する。
    fn serialize(&self) -> Result<DescriptorBuf, EncodeError> {
        self.validate()?;

        let mut w = Writer::new();
        if let Some(xtag) = Self::EDID.xtag() {
            w.write_u8(xtag);
        }
        self.write_payload(&mut w)?;
        DescriptorBuf::new(Self::EDID.tag(), w.as_bytes())
    }

    /// `parent`の子要素としてこの記述子の要素を追加し、その要素を返す。
    ///
    /// 符号化できない値を含む場合は`parent`を変更せずにエラーを返す。
    fn to_xml<'e>(&self, parent: &'e mut Element) -> Result<&'e mut Element, EncodeError> {
        self.validate()?;

        let root = parent.add_element(Self::XML_NAME);
        self.build_xml(root);
        Ok(root)
    }

    /// この記述子を表す要素を生成する。
    fn to_element(&self) -> Result<Element, EncodeError> {
        self.validate()?;

        let mut root = Element::new(Self::XML_NAME);
        self.build_xml(&mut root);
        Ok(root)
    }

    /// `element`から記述子を読み取る。
    fn from_xml(element: &Element) -> Result<Self, XmlError> {
        element.check_name(Self::XML_NAME)?;
        Self::analyze_xml(element)
    }

    /// `descriptor_tag`と`descriptor_length`を除いた`data`を表示する。
    fn display(disp: &mut TablesDisplay, data: &[u8]) {
        match (Self::EDID.xtag(), data) {
            (Some(_), [xtag, rest @ ..]) => {
                disp.line(format_args!("Extension tag: 0x{:02X}", xtag));
                Self::display_payload(disp, rest);
            }
            (Some(_), []) => disp.display_extra_data(data),
            (None, _) => Self::display_payload(disp, data),
        }
    }
}

/// 型を消去した記述子。
///
/// [`Registry`](crate::registry::Registry)から生成された記述子はこの型で扱う。
pub trait AnyDescriptor: fmt::Debug + Send + Sync {
    /// 記述子の識別子を返す。
    fn edid(&self) -> Edid;

    /// XMLの要素名を返す。
    fn xml_name(&self) -> &'static str;

    /// `descriptor_tag`と`descriptor_length`を含むバイナリ形式に変換する。
    fn to_binary(&self) -> Result<DescriptorBuf, EncodeError>;

    /// `parent`の子要素としてこの記述子の要素を追加し、その要素を返す。
    fn append_xml<'e>(&self, parent: &'e mut Element) -> Result<&'e mut Element, EncodeError>;

    /// `Any`として返す。
    fn as_any(&self) -> &dyn Any;

    /// 複製して返す。
    fn clone_box(&self) -> Box<dyn AnyDescriptor>;

    /// `other`と同じ型で同じ値であれば`true`を返す。
    fn eq_dyn(&self, other: &dyn AnyDescriptor) -> bool;
}

impl<T: Descriptor> AnyDescriptor for T {
    #[inline]
    fn edid(&self) -> Edid {
        T::EDID
    }

    #[inline]
    fn xml_name(&self) -> &'static str {
        T::XML_NAME
    }

    fn to_binary(&self) -> Result<DescriptorBuf, EncodeError> {
        self.serialize()
    }

    fn append_xml<'e>(&self, parent: &'e mut Element) -> Result<&'e mut Element, EncodeError> {
        self.to_xml(parent)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn AnyDescriptor> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn AnyDescriptor) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }
}

impl dyn AnyDescriptor {
    /// 具体的な記述子の型`T`であれば参照を返す。
    #[inline]
    pub fn downcast_ref<T: Descriptor>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

impl Clone for Box<dyn AnyDescriptor> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn AnyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

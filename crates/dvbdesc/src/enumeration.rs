//! 値と名前を対応付ける表。

use std::borrow::Cow;

/// 整数値とその名前の対応表。
///
/// XMLの属性値や表示用の文字列に使用する。名前の比較では大文字小文字を区別しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enumeration(&'static [(&'static str, u32)]);

impl Enumeration {
    /// `entries`から`Enumeration`を生成する。
    #[inline]
    pub const fn new(entries: &'static [(&'static str, u32)]) -> Enumeration {
        Enumeration(entries)
    }

    /// `value`の名前を返す。
    pub fn name(&self, value: u32) -> Option<&'static str> {
        self.0.iter().find(|&&(_, v)| v == value).map(|&(n, _)| n)
    }

    /// `name`に対応する値を返す。
    pub fn value(&self, name: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, v)| v)
    }

    /// `value`の名前を返し、名前がなければ10進数の文字列を返す。
    pub fn name_or_value(&self, value: u32) -> Cow<'static, str> {
        match self.name(value) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(value.to_string()),
        }
    }

    /// 名前または整数として`s`を解釈する。
    pub fn parse(&self, s: &str) -> Option<u32> {
        let s = s.trim();
        self.value(s)
            .or_else(|| crate::xml::parse_int(s).and_then(|v| u32::try_from(v).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: Enumeration = Enumeration::new(&[("red", 1), ("green", 2), ("Blue", 4)]);

    #[test]
    fn test_enumeration() {
        assert_eq!(COLORS.name(1), Some("red"));
        assert_eq!(COLORS.name(3), None);
        assert_eq!(COLORS.value("GREEN"), Some(2));
        assert_eq!(COLORS.value("blue"), Some(4));
        assert_eq!(COLORS.value("yellow"), None);

        assert_eq!(COLORS.name_or_value(4), "Blue");
        assert_eq!(COLORS.name_or_value(7), "7");

        assert_eq!(COLORS.parse(" red "), Some(1));
        assert_eq!(COLORS.parse("0x10"), Some(16));
        assert_eq!(COLORS.parse("9"), Some(9));
        assert_eq!(COLORS.parse("purple"), None);
    }
}

//! 境界検査付きでバイト列を読み書きするカーソル。
//!
//! 記述子の読み取りはすべて[`Reader`]を経由するため、
//! どのような入力であってもバッファの範囲外を読むことはない。

use smallvec::SmallVec;
use thiserror::Error;

/// [`Reader`]で要求したバイト数が残っていない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out of bounds: requested {requested} bytes, {remaining} remaining")]
pub struct OutOfBounds {
    /// 要求したバイト数。
    pub requested: usize,
    /// 残っていたバイト数。
    pub remaining: usize,
}

/// バイト列を先頭から読み進めるカーソル。
///
/// 読み取りに失敗した場合は位置を進めない。
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// `data`の先頭を指す`Reader`を生成する。
    #[inline]
    pub fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    /// 現在の位置を返す。
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 残りのバイト数を返す。
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// すべて読み終えていれば`true`を返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 未読のバイト列を位置を進めずに返す。
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// `n`バイトを読み取る。
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], OutOfBounds> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(OutOfBounds {
                requested: n,
                remaining,
            });
        }

        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let bytes = self.read_bytes(N)?;
        let mut array = [0; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    /// 8ビット符号無し整数を読み取る。
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// ビッグエンディアンの16ビット符号無し整数を読み取る。
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, OutOfBounds> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// ビッグエンディアンの24ビット符号無し整数を読み取る。
    #[inline]
    pub fn read_u24(&mut self) -> Result<u32, OutOfBounds> {
        self.read_array::<3>()
            .map(|[a, b, c]| u32::from_be_bytes([0, a, b, c]))
    }

    /// ビッグエンディアンの32ビット符号無し整数を読み取る。
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, OutOfBounds> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// ビッグエンディアンの64ビット符号無し整数を読み取る。
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, OutOfBounds> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// `n`バイトの固定長文字列を読み取る。
    ///
    /// 言語コードなどに使われる文字列で、各バイトはISO 8859-1の文字として扱う。
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, OutOfBounds> {
        let bytes = self.read_bytes(n)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }
}

/// バイト列を書き込むバッファ。
///
/// 書き込みは常に成功する。記述子長の上限は呼び出し側で確認する。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Writer {
    buf: SmallVec<[u8; 32]>,
}

impl Writer {
    /// 空の`Writer`を生成する。
    #[inline]
    pub fn new() -> Writer {
        Writer::default()
    }

    /// 書き込んだバイト数を返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// 何も書き込んでいなければ`true`を返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// 書き込んだバイト列を返す。
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// バイト列を書き込む。
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// 8ビット符号無し整数を書き込む。
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// ビッグエンディアンで16ビット符号無し整数を書き込む。
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// ビッグエンディアンで24ビット符号無し整数の下位24ビットを書き込む。
    #[inline]
    pub fn write_u24(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes()[1..]);
    }

    /// ビッグエンディアンで32ビット符号無し整数を書き込む。
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// ビッグエンディアンで64ビット符号無し整数を書き込む。
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// 固定長文字列を書き込む。
    ///
    /// 文字数が`n`でない場合やISO 8859-1で表せない文字を含む場合は何も書き込まずに`false`を返す。
    pub fn write_fixed_string(&mut self, s: &str, n: usize) -> bool {
        match encode_fixed_string(s, n) {
            Some(bytes) => {
                self.write_bytes(&bytes);
                true
            }
            None => false,
        }
    }
}

/// `s`を`n`バイトの固定長文字列としてISO 8859-1で符号化する。
///
/// 文字数が`n`でない場合やISO 8859-1で表せない文字を含む場合は`None`を返す。
/// XMLの属性値も同じ規則で検査する。
pub fn encode_fixed_string(s: &str, n: usize) -> Option<SmallVec<[u8; 8]>> {
    let bytes = s
        .chars()
        .map(|c| u8::try_from(c).ok())
        .collect::<Option<SmallVec<[u8; 8]>>>()?;
    (bytes.len() == n).then_some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_reader() {
        let data = hex_literal::hex!("01 0203 040506 0708090A 0B0C0D0E0F101112 6A706E");
        let mut r = Reader::new(&data);
        assert_eq!(r.read_u8(), Ok(0x01));
        assert_eq!(r.read_u16(), Ok(0x0203));
        assert_eq!(r.read_u24(), Ok(0x040506));
        assert_eq!(r.read_u32(), Ok(0x0708090A));
        assert_eq!(r.read_u64(), Ok(0x0B0C0D0E0F101112));
        assert_eq!(r.position(), 18);
        assert_eq!(r.rest(), b"jpn");
        assert_eq!(r.read_fixed_string(3).as_deref(), Ok("jpn"));
        assert!(r.is_empty());
    }

    #[test]
    fn test_reader_out_of_bounds() {
        let mut r = Reader::new(&[0x12, 0x34, 0x56]);
        assert_eq!(r.read_u8(), Ok(0x12));
        assert_matches!(
            r.read_u32(),
            Err(OutOfBounds {
                requested: 4,
                remaining: 2
            })
        );
        // 失敗しても位置は変わらない
        assert_eq!(r.position(), 1);
        assert_matches!(r.read_u24(), Err(_));
        assert_matches!(r.read_bytes(3), Err(_));
        assert_matches!(r.read_fixed_string(3), Err(_));
        assert_eq!(r.read_u16(), Ok(0x3456));
        assert_matches!(r.read_u8(), Err(_));
        assert_eq!(r.read_bytes(0), Ok(&[] as &[u8]));
    }

    #[test]
    fn test_reader_latin1() {
        let mut r = Reader::new(&[0x66, 0xE9, 0x65]);
        assert_eq!(r.read_fixed_string(3).as_deref(), Ok("fée"));
    }

    #[test]
    fn test_writer() {
        let mut w = Writer::new();
        assert!(w.is_empty());
        w.write_u8(0x01);
        w.write_u16(0x0203);
        w.write_u24(0xFF040506);
        w.write_u32(0x0708090A);
        w.write_u64(0x0B0C0D0E0F101112);
        assert!(w.write_fixed_string("fée", 3));
        assert_eq!(
            w.as_bytes(),
            hex_literal::hex!("01 0203 040506 0708090A 0B0C0D0E0F101112 66E965"),
        );
        assert_eq!(w.len(), 21);
    }

    #[test]
    fn test_writer_fixed_string() {
        let mut w = Writer::new();
        assert!(!w.write_fixed_string("en", 3));
        assert!(!w.write_fixed_string("engl", 3));
        assert!(!w.write_fixed_string("日本語", 3));
        assert!(w.is_empty());
    }
}

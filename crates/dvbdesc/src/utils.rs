use std::fmt;

/// バイト列用拡張トレイト。
pub trait BytesExt {
    /// 先頭2バイトをビッグエンディアンの16ビット符号無し整数として読み込む。
    fn read_be_16(&self) -> u16;

    /// 先頭4バイトをビッグエンディアンの32ビット符号無し整数として読み込む。
    fn read_be_32(&self) -> u32;
}

impl BytesExt for [u8] {
    #[inline]
    fn read_be_16(&self) -> u16 {
        u16::from_be_bytes([self[0], self[1]])
    }

    #[inline]
    fn read_be_32(&self) -> u32 {
        u32::from_be_bytes([self[0], self[1], self[2], self[3]])
    }
}

/// 上位桁から詰められた`digits`桁のBCDを数値に変換する。
///
/// `value`の最上位ニブルから順に`digits`桁を読み、下位の余りビットは無視する。
/// 10以上のニブルを含む場合は`None`を返す。
pub fn decode_bcd(value: u32, digits: u32) -> Option<u32> {
    debug_assert!(digits <= 8);

    let mut n = 0;
    for i in 0..digits {
        let nibble = (value >> (28 - i * 4)) & 0x0F;
        if nibble > 9 {
            return None;
        }
        n = n * 10 + nibble;
    }
    Some(n)
}

/// `value`を`digits`桁のBCDとして上位桁から詰めた32ビット値に変換する。
///
/// `value`が`digits`桁に収まらない場合は`None`を返す。
pub fn encode_bcd(mut value: u32, digits: u32) -> Option<u32> {
    debug_assert!(digits <= 8);

    let mut bcd = 0;
    for i in 0..digits {
        let shift = 28 - (digits - 1 - i) * 4;
        bcd |= (value % 10) << shift;
        value /= 10;
    }
    if value != 0 {
        return None;
    }
    Some(bcd)
}

/// 上位から`digits`桁のBCDを`int_digits`桁目の後に小数点を入れて表示用の文字列にする。
///
/// 10以上のニブルもそのまま16進数で表示する。
pub fn format_bcd(value: u32, digits: usize, int_digits: usize) -> String {
    let s = format!("{:08X}", value);
    let (int, frac) = s[..digits].split_at(int_digits);
    let int = int.trim_start_matches('0');
    format!("{}.{}", if int.is_empty() { "0" } else { int }, frac)
}

/// `{:?}`で`0x`付きの大文字16進数を表示する。
pub struct UpperHex<T>(pub T);

impl<T: fmt::UpperHex> fmt::Debug for UpperHex<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// バイト列を空白区切りの16進数として表示する。
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be() {
        assert_eq!(b"\x12\x34\x56\x78"[..].read_be_16(), 0x1234);
        assert_eq!(b"\x12\x34\x56\x78\x9A\xBC\xDE"[..].read_be_32(), 0x12345678);
    }

    #[test]
    fn test_bcd() {
        assert_eq!(decode_bcd(0x0117_2700, 8), Some(1172700));
        assert_eq!(decode_bcd(0x0275_0003, 7), Some(275000));
        assert_eq!(decode_bcd(0x1920_0000, 4), Some(1920));
        assert_eq!(decode_bcd(0x0A00_0000, 8), None);
        // 桁数外のニブルは見ない
        assert_eq!(decode_bcd(0x1234_567F, 7), Some(1234567));

        assert_eq!(encode_bcd(1172700, 8), Some(0x0117_2700));
        assert_eq!(encode_bcd(275000, 7), Some(0x0275_0000));
        assert_eq!(encode_bcd(1920, 4), Some(0x1920_0000));
        assert_eq!(encode_bcd(99_999_999, 8), Some(0x9999_9999));
        assert_eq!(encode_bcd(100_000_000, 8), None);
        assert_eq!(encode_bcd(10000, 4), None);

        assert_eq!(format_bcd(0x0117_2700, 8, 3), "11.72700");
        assert_eq!(format_bcd(0x0474_0000, 8, 4), "474.0000");
        assert_eq!(format_bcd(0x0000_0000, 4, 3), "0.0");
    }

    #[test]
    fn test_hex() {
        assert_eq!(format!("{:?}", UpperHex(0x5Fu8)), "0x5F");
        assert_eq!(HexBytes(&[0x01, 0xAB, 0xFF]).to_string(), "01 AB FF");
        assert_eq!(HexBytes(&[]).to_string(), "");
    }
}

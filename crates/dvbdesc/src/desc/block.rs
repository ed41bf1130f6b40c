//! 記述子のバイト列と記述子ループ。

use std::fmt;

use arrayvec::ArrayVec;

use crate::utils::{BytesExt, HexBytes, UpperHex};

use super::base::{Descriptor, EncodeError};
use super::edid::{tag, Edid};

/// パース前の記述子。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawDescriptor<'a> {
    /// 記述子のタグ。
    pub tag: u8,

    /// 記述子の内容。
    pub data: &'a [u8],
}

impl<'a> RawDescriptor<'a> {
    /// `pds`をプライベートデータ指定子としてこの記述子の`Edid`を返す。
    #[inline]
    pub fn edid(&self, pds: u32) -> Edid {
        Edid::classify(self.tag, self.data, pds)
    }

    /// 所有権を持つ[`DescriptorBuf`]に変換する。
    #[inline]
    pub fn to_buf(&self) -> Result<DescriptorBuf, EncodeError> {
        DescriptorBuf::new(self.tag, self.data)
    }
}

impl<'a> fmt::Debug for RawDescriptor<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        struct PrintBytes<'a>(&'a [u8]);
        impl<'a> fmt::Debug for PrintBytes<'a> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{} bytes", self.0.len())
            }
        }

        f.debug_struct("RawDescriptor")
            .field("tag", &UpperHex(self.tag))
            .field("data", &PrintBytes(self.data))
            .finish()
    }
}

/// `descriptor_tag`と`descriptor_length`を含む、所有権を持つ記述子のバイト列。
///
/// 内容が255バイト以下であることが保証される。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DescriptorBuf(ArrayVec<u8, MAX_DESCRIPTOR_SIZE>);

const MAX_DESCRIPTOR_SIZE: usize = 2 + 255;

impl DescriptorBuf {
    /// 記述子の内容の最大長。
    pub const MAX_PAYLOAD_SIZE: usize = MAX_DESCRIPTOR_SIZE - 2;

    /// タグと内容から`DescriptorBuf`を生成する。
    pub fn new(tag: u8, payload: &[u8]) -> Result<DescriptorBuf, EncodeError> {
        let Ok(length) = u8::try_from(payload.len()) else {
            return Err(EncodeError::PayloadTooLong(payload.len()));
        };

        let mut buf = ArrayVec::new();
        buf.push(tag);
        buf.push(length);
        // 長さは確認済み
        buf.try_extend_from_slice(payload)
            .map_err(|_| EncodeError::PayloadTooLong(payload.len()))?;
        Ok(DescriptorBuf(buf))
    }

    /// `data`の先頭から記述子を1つ読み取り、後続データと共に返す。
    ///
    /// `data`が`2 + descriptor_length`バイトに満たない場合は`None`を返す。
    pub fn read(data: &[u8]) -> Option<(DescriptorBuf, &[u8])> {
        let [tag, length, ref rem @ ..] = *data else {
            return None;
        };
        if rem.len() < length as usize {
            return None;
        }

        let (payload, tail) = rem.split_at(length as usize);
        let buf = DescriptorBuf::new(tag, payload).ok()?;
        Some((buf, tail))
    }

    /// 記述子のタグを返す。
    #[inline]
    pub fn tag(&self) -> u8 {
        self.0[0]
    }

    /// `descriptor_length`を返す。
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.0[1] as usize
    }

    /// 記述子の内容を返す。
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.0[2..]
    }

    /// `descriptor_tag`と`descriptor_length`を含むバイト列を返す。
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 借用した[`RawDescriptor`]として返す。
    #[inline]
    pub fn as_raw(&self) -> RawDescriptor<'_> {
        RawDescriptor {
            tag: self.tag(),
            data: self.payload(),
        }
    }

    /// `pds`をプライベートデータ指定子としてこの記述子の`Edid`を返す。
    #[inline]
    pub fn edid(&self, pds: u32) -> Edid {
        self.as_raw().edid(pds)
    }
}

impl fmt::Debug for DescriptorBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DescriptorBuf({})", HexBytes(self.as_bytes()))
    }
}

impl AsRef<[u8]> for DescriptorBuf {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// 複数の記述子からなる記述子群。
#[derive(Clone, PartialEq, Eq)]
pub struct DescriptorBlock<'a>(&'a [u8]);

impl<'a> DescriptorBlock<'a> {
    /// 複数の記述子を含む`block`から`DescriptorBlock`を生成する。
    ///
    /// `block`の中身は`get`で初めてパースされる。
    #[inline]
    pub fn new(block: &'a [u8]) -> DescriptorBlock<'a> {
        DescriptorBlock(block)
    }

    /// `data`から`length`バイト分の記述子群を読み取り後続データと共に返す。
    ///
    /// データ長が不足している場合は`None`を返す。
    pub fn read_with_len(data: &'a [u8], length: u16) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        if data.len() < length as usize {
            return None;
        }

        let (block, rem) = data.split_at(length as usize);
        Some((DescriptorBlock(block), rem))
    }

    /// 12ビットの記述子ループ長に続く記述子群を`data`から読み取り後続データと共に返す。
    ///
    /// データ長が不足している場合は`None`を返す。
    #[inline]
    pub fn read(data: &'a [u8]) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        if data.len() < 2 {
            return None;
        }

        let length = data[0..=1].read_be_16() & 0b0000_1111_1111_1111;
        DescriptorBlock::read_with_len(&data[2..], length)
    }

    /// 記述子群のバイト列を返す。
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// 内包する記述子群のイテレーターを返す。
    #[inline]
    pub fn iter(&self) -> DescriptorIter<'a> {
        DescriptorIter(self.0)
    }

    /// 内包する記述子群を、プライベートデータ指定子を追跡しながら判別するイテレーターを返す。
    ///
    /// `default_pds`は記述子ループの先頭で有効なプライベートデータ指定子で、無い場合は0とする。
    #[inline]
    pub fn classify(&self, default_pds: u32) -> ClassifiedIter<'a> {
        ClassifiedIter {
            inner: self.iter(),
            pds: default_pds,
        }
    }

    /// 内包する記述子群から`T`の識別子と一致する記述子を読み取って返す。
    ///
    /// `T`と一致する記述子がない場合は`None`を返す。
    pub fn get<T: Descriptor>(&self, default_pds: u32) -> Option<T> {
        self.classify(default_pds)
            .find(|(edid, _)| *edid == T::EDID)
            .and_then(|(_, d)| T::read(d.data))
    }

    /// 内包する記述子群から`T`の識別子と一致する記述子をすべて読み取って返す。
    pub fn get_all<T: Descriptor>(&self, default_pds: u32) -> impl Iterator<Item = T> + 'a {
        self.classify(default_pds).filter_map(|(edid, d)| {
            if edid == T::EDID {
                T::read(d.data)
            } else {
                None
            }
        })
    }
}

impl<'a> fmt::Debug for DescriptorBlock<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DescriptorBlock(")?;
        f.debug_list().entries(self).finish()?;
        f.write_str(")")
    }
}

impl<'a> IntoIterator for &DescriptorBlock<'a> {
    type Item = RawDescriptor<'a>;
    type IntoIter = DescriptorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [`DescriptorBlock`]のイテレーター。
///
/// 長さが不足する記述子に到達した時点で終了する。
#[derive(Clone)]
pub struct DescriptorIter<'a>(&'a [u8]);

impl<'a> DescriptorIter<'a> {
    /// 読み残したバイト列を返す。
    ///
    /// 終端まで読んだ後に空でなければ、末尾の記述子が壊れている。
    #[inline]
    pub fn remainder(&self) -> &'a [u8] {
        self.0
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = RawDescriptor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let [tag, length, ref rem @ ..] = *self.0 else {
            return None;
        };
        if rem.len() < length as usize {
            return None;
        }

        let (data, tail) = rem.split_at(length as usize);
        self.0 = tail;
        Some(RawDescriptor { tag, data })
    }
}

impl<'a> std::iter::FusedIterator for DescriptorIter<'a> {}

impl<'a> fmt::Debug for DescriptorIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DescriptorIter(")?;
        f.debug_list().entries(self.clone()).finish()?;
        f.write_str(")")
    }
}

/// 記述子ごとに[`Edid`]を判別するイテレーター。
///
/// プライベートデータ指定記述子を読むと、以降の記述子にそのプライベートデータ指定子を適用する。
#[derive(Debug, Clone)]
pub struct ClassifiedIter<'a> {
    inner: DescriptorIter<'a>,
    pds: u32,
}

impl<'a> ClassifiedIter<'a> {
    /// 現在有効なプライベートデータ指定子を返す。
    #[inline]
    pub fn pds(&self) -> u32 {
        self.pds
    }
}

impl<'a> Iterator for ClassifiedIter<'a> {
    type Item = (Edid, RawDescriptor<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let desc = self.inner.next()?;
        let edid = desc.edid(self.pds);
        if desc.tag == tag::PRIVATE_DATA_SPECIFIER && desc.data.len() >= 4 {
            self.pds = desc.data.read_be_32();
        }
        Some((edid, desc))
    }
}

impl<'a> std::iter::FusedIterator for ClassifiedIter<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::edid::{pds, xtag};
    use assert_matches::assert_matches;

    #[test]
    fn test_descriptor_buf() {
        let buf = DescriptorBuf::new(0x5F, &[0x00, 0x00, 0x00, 0x28]).unwrap();
        assert_eq!(buf.as_bytes(), hex_literal::hex!("5F 04 00000028"));
        assert_eq!(buf.tag(), 0x5F);
        assert_eq!(buf.payload_len(), 4);
        assert_eq!(buf.payload(), hex_literal::hex!("00000028"));
        assert_eq!(buf.edid(0), Edid::standard(0x5F));
        assert_eq!(format!("{:?}", buf), "DescriptorBuf(5F 04 00 00 00 28)");

        assert!(DescriptorBuf::new(0x80, &[0; 255]).is_ok());
        assert_matches!(
            DescriptorBuf::new(0x80, &[0; 256]),
            Err(EncodeError::PayloadTooLong(256))
        );
    }

    #[test]
    fn test_descriptor_buf_read() {
        let data = hex_literal::hex!("59 08 656E67 10 0001 0002 FF");
        let (buf, tail) = DescriptorBuf::read(&data).unwrap();
        assert_eq!(buf.tag(), 0x59);
        assert_eq!(buf.payload().len(), 8);
        assert_eq!(tail, [0xFF]);

        // 記述子長に満たない
        assert_eq!(DescriptorBuf::read(&data[..9]), None);
        assert_eq!(DescriptorBuf::read(&[0x59]), None);
        assert_eq!(DescriptorBuf::read(&[]), None);
        assert!(DescriptorBuf::read(&[0x59, 0x00]).is_some());
    }

    #[test]
    fn test_descriptor_block() {
        let data = hex_literal::hex!(
            "
            F0 11
            5F 04 00000028
            83 04 0001 FC01
            7F 03 02 0001
            FF
            "
        );
        let (block, rem) = DescriptorBlock::read(&data).unwrap();
        assert_eq!(rem, [0xFF]);

        let mut iter = block.iter();
        assert_eq!(iter.next().map(|d| d.tag), Some(0x5F));
        assert_eq!(iter.next().map(|d| d.data), Some(&[0x00, 0x01, 0xFC, 0x01][..]));
        assert_eq!(iter.next().map(|d| d.tag), Some(0x7F));
        assert_eq!(iter.next(), None);
        assert!(iter.remainder().is_empty());

        let edids: Vec<Edid> = block.classify(0).map(|(edid, _)| edid).collect();
        assert_eq!(
            edids,
            [
                Edid::standard(0x5F),
                Edid::private(0x83, pds::EACEM),
                Edid::extension(xtag::CP_IDENTIFIER),
            ],
        );

        assert_eq!(DescriptorBlock::read(&[0xF0]), None);
        assert_eq!(DescriptorBlock::read(&[0xF0, 0x03, 0x00]), None);
    }

    #[test]
    fn test_descriptor_block_broken() {
        let block = DescriptorBlock::new(&[0x59, 0x00, 0x83, 0x04, 0x00]);
        let mut iter = block.iter();
        assert_eq!(iter.next().map(|d| d.tag), Some(0x59));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.remainder(), [0x83, 0x04, 0x00]);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_classify_default_pds() {
        let block = DescriptorBlock::new(&[0x83, 0x00, 0x5F, 0x04, 0x00, 0x00, 0x00, 0x29, 0x83, 0x00]);
        let mut iter = block.classify(pds::EACEM);
        assert_eq!(iter.next().unwrap().0, Edid::private(0x83, pds::EACEM));
        assert_eq!(iter.next().unwrap().0, Edid::standard(0x5F));
        assert_eq!(iter.pds(), pds::NORDIG);
        assert_eq!(iter.next().unwrap().0, Edid::private(0x83, pds::NORDIG));
        assert_eq!(iter.next(), None);
    }
}

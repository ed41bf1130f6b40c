//! 記述子の識別子。

use std::fmt;

/// 記述子タグの定数。
pub mod tag {
    /// 衛星分配システム記述子。
    pub const SATELLITE_DELIVERY: u8 = 0x43;
    /// 有線分配システム記述子。
    pub const CABLE_DELIVERY: u8 = 0x44;
    /// 字幕記述子。
    pub const SUBTITLING: u8 = 0x59;
    /// プライベートデータ指定記述子。
    pub const PRIVATE_DATA_SPECIFIER: u8 = 0x5F;
    /// 拡張記述子。
    pub const EXTENSION: u8 = 0x7F;
    /// EACEMの論理チャンネル番号記述子。
    pub const EACEM_LOGICAL_CHANNEL_NUMBER: u8 = 0x83;
}

/// 拡張記述子タグの定数。
pub mod xtag {
    /// CP識別記述子。
    pub const CP_IDENTIFIER: u8 = 0x02;
}

/// プライベートデータ指定子の定数。
pub mod pds {
    /// EACEM / EICTA。
    pub const EACEM: u32 = 0x0000_0028;
    /// EUTELSAT。
    pub const EUTELSAT: u32 = 0x0000_0055;
    /// NorDig。
    pub const NORDIG: u32 = 0x0000_0029;
    /// Ofcom / DTG。
    pub const OFCOM: u32 = 0x0000_233A;
}

/// タグ以外に記述子を識別するための値。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtensionKind {
    /// タグだけで識別される記述子。
    None,
    /// 拡張記述子における拡張タグ。
    Extended(u8),
    /// プライベート記述子におけるプライベートデータ指定子。
    Private(u32),
}

/// 記述子の種類を一意に表す識別子。
///
/// タグと、タグが拡張記述子やプライベート記述子の範囲にある場合はその付加情報からなる。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edid {
    tag: u8,
    ext: ExtensionKind,
}

impl Edid {
    /// タグだけで識別される記述子の`Edid`を生成する。
    #[inline]
    pub const fn standard(tag: u8) -> Edid {
        Edid {
            tag,
            ext: ExtensionKind::None,
        }
    }

    /// 拡張記述子の`Edid`を生成する。
    #[inline]
    pub const fn extension(xtag: u8) -> Edid {
        Edid {
            tag: tag::EXTENSION,
            ext: ExtensionKind::Extended(xtag),
        }
    }

    /// プライベート記述子の`Edid`を生成する。
    ///
    /// `tag`がプライベートの範囲（`0x80..=0xFE`）にない場合や`pds`が0の場合はパニックする。
    #[inline]
    pub const fn private(tag: u8, pds: u32) -> Edid {
        assert!(Edid::is_private_tag(tag) && pds != 0);
        Edid {
            tag,
            ext: ExtensionKind::Private(pds),
        }
    }

    /// 記述子のタグとペイロードから`Edid`を判別する。
    ///
    /// `pds`にはその記述子に適用されるプライベートデータ指定子を指定し、無い場合は0とする。
    /// 拡張タグを持たない拡張記述子はタグだけで識別される。
    pub fn classify(tag: u8, payload: &[u8], pds: u32) -> Edid {
        match tag {
            tag::EXTENSION => match payload.first() {
                Some(&xtag) => Edid::extension(xtag),
                None => Edid::standard(tag),
            },
            tag if Edid::is_private_tag(tag) && pds != 0 => Edid {
                tag,
                ext: ExtensionKind::Private(pds),
            },
            tag => Edid::standard(tag),
        }
    }

    /// `tag`がプライベート記述子の範囲にあれば`true`を返す。
    #[inline]
    pub const fn is_private_tag(tag: u8) -> bool {
        tag >= 0x80 && tag != 0xFF
    }

    /// 記述子のタグを返す。
    #[inline]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// タグ以外の識別情報を返す。
    #[inline]
    pub fn kind(&self) -> ExtensionKind {
        self.ext
    }

    /// 拡張記述子であれば拡張タグを返す。
    #[inline]
    pub fn xtag(&self) -> Option<u8> {
        match self.ext {
            ExtensionKind::Extended(xtag) => Some(xtag),
            _ => None,
        }
    }

    /// プライベート記述子であればプライベートデータ指定子を返す。
    #[inline]
    pub fn pds(&self) -> Option<u32> {
        match self.ext {
            ExtensionKind::Private(pds) => Some(pds),
            _ => None,
        }
    }
}

impl fmt::Debug for Edid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Edid({})", self)
    }
}

impl fmt::Display for Edid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.tag)?;
        match self.ext {
            ExtensionKind::None => Ok(()),
            ExtensionKind::Extended(xtag) => write!(f, "/0x{:02X}", xtag),
            ExtensionKind::Private(pds) => write!(f, ", pds 0x{:08X}", pds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edid_classify() {
        assert_eq!(
            Edid::classify(0x59, &[], 0),
            Edid::standard(tag::SUBTITLING),
        );
        // プライベートデータ指定子は標準の範囲には影響しない
        assert_eq!(
            Edid::classify(0x59, &[], pds::EACEM),
            Edid::standard(tag::SUBTITLING),
        );
        assert_eq!(
            Edid::classify(0x7F, &[0x02, 0x12], 0),
            Edid::extension(xtag::CP_IDENTIFIER),
        );
        assert_eq!(Edid::classify(0x7F, &[], 0), Edid::standard(0x7F));
        assert_eq!(
            Edid::classify(0x83, &[], pds::EACEM),
            Edid::private(tag::EACEM_LOGICAL_CHANNEL_NUMBER, pds::EACEM),
        );
        assert_eq!(Edid::classify(0x83, &[], 0), Edid::standard(0x83));
        assert_eq!(Edid::classify(0xFF, &[], pds::EACEM), Edid::standard(0xFF));
    }

    #[test]
    fn test_edid_accessor() {
        let edid = Edid::private(0x83, pds::EACEM);
        assert_eq!(edid.tag(), 0x83);
        assert_eq!(edid.kind(), ExtensionKind::Private(0x28));
        assert_eq!(edid.pds(), Some(0x28));
        assert_eq!(edid.xtag(), None);

        let edid = Edid::extension(0x02);
        assert_eq!(edid.tag(), 0x7F);
        assert_eq!(edid.xtag(), Some(0x02));
        assert_eq!(edid.pds(), None);

        std::panic::catch_unwind(|| Edid::private(0x59, pds::EACEM)).unwrap_err();
        std::panic::catch_unwind(|| Edid::private(0x83, 0)).unwrap_err();
    }

    #[test]
    fn test_edid_order() {
        assert!(Edid::standard(0x43) < Edid::standard(0x44));
        assert!(Edid::standard(0x7F) < Edid::extension(0x00));
        assert!(Edid::extension(0x02) < Edid::extension(0x03));
        assert_ne!(Edid::private(0x83, 0x28), Edid::private(0x83, 0x29));
        assert_ne!(Edid::private(0x83, 0x28), Edid::standard(0x83));
    }

    #[test]
    fn test_edid_fmt() {
        assert_eq!(Edid::standard(0x59).to_string(), "0x59");
        assert_eq!(Edid::extension(0x02).to_string(), "0x7F/0x02");
        assert_eq!(
            Edid::private(0x83, 0x28).to_string(),
            "0x83, pds 0x00000028",
        );
        assert_eq!(format!("{:?}", Edid::standard(0x43)), "Edid(0x43)");
    }
}

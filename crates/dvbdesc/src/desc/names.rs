//! 複数の記述子で共有する名前の表。

use crate::enumeration::Enumeration;

use super::edid::pds;

/// 衛星の東経西経フラグ。
pub const DIRECTION: Enumeration = Enumeration::new(&[("west", 0), ("east", 1)]);

/// 偏波。
pub const POLARIZATION: Enumeration = Enumeration::new(&[
    ("horizontal", 0),
    ("vertical", 1),
    ("left", 2),
    ("right", 3),
]);

/// DVB-S2のロールオフ率。
pub const ROLL_OFF: Enumeration = Enumeration::new(&[
    ("0.35", 0),
    ("0.25", 1),
    ("0.20", 2),
    ("reserved", 3),
]);

/// 衛星の変調方式。
pub const MODULATION_SYSTEM: Enumeration = Enumeration::new(&[("DVB-S", 0), ("DVB-S2", 1)]);

/// 衛星の変調。
pub const SATELLITE_MODULATION: Enumeration = Enumeration::new(&[
    ("auto", 0),
    ("QPSK", 1),
    ("8PSK", 2),
    ("16-QAM", 3),
]);

/// FEC内符号の符号化率。
pub const CODE_RATE: Enumeration = Enumeration::new(&[
    ("undefined", 0),
    ("1/2", 1),
    ("2/3", 2),
    ("3/4", 3),
    ("5/6", 4),
    ("7/8", 5),
    ("8/9", 6),
    ("3/5", 7),
    ("4/5", 8),
    ("9/10", 9),
    ("none", 15),
]);

/// 有線の変調。
pub const CABLE_MODULATION: Enumeration = Enumeration::new(&[
    ("undefined", 0),
    ("16-QAM", 1),
    ("32-QAM", 2),
    ("64-QAM", 3),
    ("128-QAM", 4),
    ("256-QAM", 5),
]);

/// FEC外符号。
pub const OUTER_FEC: Enumeration = Enumeration::new(&[("undefined", 0), ("none", 1), ("RS", 2)]);

/// 字幕の種類（`stream_content`が`0x03`のコンポーネント種別）。
pub const SUBTITLING_TYPE: Enumeration = Enumeration::new(&[
    ("EBU Teletext subtitles", 0x01),
    ("associated EBU Teletext", 0x02),
    ("VBI data", 0x03),
    ("DVB subtitles (normal) with no monitor aspect ratio criticality", 0x10),
    ("DVB subtitles (normal) for display on 4:3 aspect ratio monitor", 0x11),
    ("DVB subtitles (normal) for display on 16:9 aspect ratio monitor", 0x12),
    ("DVB subtitles (normal) for display on 2.21:1 aspect ratio monitor", 0x13),
    ("DVB subtitles (normal) for display on a high definition monitor", 0x14),
    ("DVB subtitles (normal) with plano-stereoscopic disparity", 0x15),
    ("DVB subtitles (for the hard of hearing) with no monitor aspect ratio criticality", 0x20),
    ("DVB subtitles (for the hard of hearing) for display on 4:3 aspect ratio monitor", 0x21),
    ("DVB subtitles (for the hard of hearing) for display on 16:9 aspect ratio monitor", 0x22),
    ("DVB subtitles (for the hard of hearing) for display on 2.21:1 aspect ratio monitor", 0x23),
    ("DVB subtitles (for the hard of hearing) for display on a high definition monitor", 0x24),
    ("DVB subtitles (for the hard of hearing) with plano-stereoscopic disparity", 0x25),
    ("open (in-vision) sign language interpretation for the deaf", 0x30),
    ("closed sign language interpretation for the deaf", 0x31),
]);

/// プライベートデータ指定子。
pub const PRIVATE_DATA_SPECIFIER: Enumeration = Enumeration::new(&[
    ("SES", 0x0000_0001),
    ("BskyB", 0x0000_0002),
    ("EACEM", pds::EACEM),
    ("NorDig", pds::NORDIG),
    ("Eutelsat", pds::EUTELSAT),
    ("Ofcom", pds::OFCOM),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(CODE_RATE.name(3), Some("3/4"));
        assert_eq!(CODE_RATE.name(10), None);
        assert_eq!(CODE_RATE.value("NONE"), Some(15));
        assert_eq!(SATELLITE_MODULATION.value("16-qam"), Some(3));
        assert_eq!(CABLE_MODULATION.value("16-QAM"), Some(1));
        assert_eq!(PRIVATE_DATA_SPECIFIER.parse("eacem"), Some(0x28));
        assert_eq!(PRIVATE_DATA_SPECIFIER.name_or_value(0x1234), "4660");
    }
}

//! 衛星分配システム記述子。

use crate::cursor::{Reader, Writer};
use crate::display::TablesDisplay;
use crate::types::{DeliverySystem, Polarization};
use crate::utils::{decode_bcd, encode_bcd, format_bcd};
use crate::xml::{Element, XmlError};

use super::base::{DecodeError, Descriptor, EncodeError};
use super::edid::{tag, Edid};
use super::names;

/// 記述子の内容の長さ。
const PAYLOAD_SIZE: usize = 11;

/// 周波数の単位（10kHz）。
const FREQUENCY_UNIT: u64 = 10_000;

/// シンボルレートの単位（100シンボル/秒）。
const SYMBOL_RATE_UNIT: u64 = 100;

/// 衛星分配システム記述子。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SatelliteDeliverySystemDescriptor {
    /// 周波数（単位はHz）。
    ///
    /// 10kHz単位で符号化されるため10kHzの倍数でなければならない。
    pub frequency: u64,
    /// 軌道（単位は0.1度）。
    pub orbital_position: u16,
    /// 東経西経フラグ。東経の場合は`true`。
    pub west_east_flag: bool,
    /// 偏波。
    pub polarization: Polarization,
    /// ロールオフ率（2ビット）。DVB-S2でのみ意味を持つ。
    pub roll_off: u8,
    /// DVB-S2であれば`true`。
    pub dvb_s2: bool,
    /// 変調（2ビット）。
    pub modulation_type: u8,
    /// シンボルレート（単位はシンボル/秒）。
    ///
    /// 100シンボル/秒単位で符号化されるため100の倍数でなければならない。
    pub symbol_rate: u64,
    /// FEC（内符号、4ビット）。
    pub fec_inner: u8,
}

impl SatelliteDeliverySystemDescriptor {
    /// 分配システムの種類を返す。
    #[inline]
    pub fn delivery_system(&self) -> DeliverySystem {
        if self.dvb_s2 {
            DeliverySystem::DvbS2
        } else {
            DeliverySystem::DvbS
        }
    }

    /// 各フィールドが符号化できる値か検査し、不正な場合はそのXML属性名を返す。
    fn check_fields(&self) -> Result<(), &'static str> {
        if self.frequency % FREQUENCY_UNIT != 0 || self.frequency / FREQUENCY_UNIT > 99_999_999 {
            return Err("frequency");
        }
        if self.orbital_position > 9999 {
            return Err("orbital_position");
        }
        if self.roll_off > 0b11 {
            return Err("roll_off");
        }
        if self.modulation_type > 0b11 {
            return Err("modulation_type");
        }
        if self.symbol_rate % SYMBOL_RATE_UNIT != 0 || self.symbol_rate / SYMBOL_RATE_UNIT > 9_999_999
        {
            return Err("symbol_rate");
        }
        if self.fec_inner > 0x0F {
            return Err("FEC_inner");
        }
        Ok(())
    }
}

/// 0.1度単位の軌道を`19.2`の形式にする。
fn format_orbital_position(orbital_position: u16) -> String {
    format!("{}.{}", orbital_position / 10, orbital_position % 10)
}

/// `19.2`の形式の軌道を0.1度単位の値にする。
fn parse_orbital_position(s: &str) -> Option<u16> {
    let s = s.trim();
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (s, "0"),
    };
    if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let [frac] = frac.as_bytes() else {
        return None;
    };
    if !frac.is_ascii_digit() {
        return None;
    }

    let value = int.parse::<u16>().ok()?.checked_mul(10)?;
    value.checked_add((frac - b'0') as u16)
}

impl Descriptor for SatelliteDeliverySystemDescriptor {
    const EDID: Edid = Edid::standard(tag::SATELLITE_DELIVERY);
    const XML_NAME: &'static str = "satellite_delivery_system_descriptor";
    const DISPLAY_NAME: &'static str = "satellite delivery system descriptor";

    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError> {
        if r.remaining() != PAYLOAD_SIZE {
            return Err(DecodeError::InvalidField("descriptor_length"));
        }

        let frequency =
            decode_bcd(r.read_u32()?, 8).ok_or(DecodeError::InvalidField("frequency"))?;
        let orbital_position = decode_bcd((r.read_u16()? as u32) << 16, 4)
            .ok_or(DecodeError::InvalidField("orbital_position"))?;
        let flags = r.read_u8()?;
        let west_east_flag = flags & 0b10000000 != 0;
        let polarization = Polarization::from_bits((flags & 0b01100000) >> 5);
        let roll_off = (flags & 0b00011000) >> 3;
        let dvb_s2 = flags & 0b00000100 != 0;
        let modulation_type = flags & 0b00000011;
        let sr_fec = r.read_u32()?;
        let symbol_rate =
            decode_bcd(sr_fec, 7).ok_or(DecodeError::InvalidField("symbol_rate"))?;
        let fec_inner = (sr_fec & 0x0F) as u8;

        Ok(SatelliteDeliverySystemDescriptor {
            frequency: frequency as u64 * FREQUENCY_UNIT,
            orbital_position: orbital_position as u16,
            west_east_flag,
            polarization,
            roll_off,
            dvb_s2,
            modulation_type,
            symbol_rate: symbol_rate as u64 * SYMBOL_RATE_UNIT,
            fec_inner,
        })
    }

    fn validate(&self) -> Result<(), EncodeError> {
        self.check_fields().map_err(EncodeError::InvalidField)
    }

    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        // validateで桁数を確認済み
        let frequency = encode_bcd((self.frequency / FREQUENCY_UNIT) as u32, 8)
            .ok_or(EncodeError::InvalidField("frequency"))?;
        let orbital_position = encode_bcd(self.orbital_position as u32, 4)
            .ok_or(EncodeError::InvalidField("orbital_position"))?;
        let symbol_rate = encode_bcd((self.symbol_rate / SYMBOL_RATE_UNIT) as u32, 7)
            .ok_or(EncodeError::InvalidField("symbol_rate"))?;

        w.write_u32(frequency);
        w.write_u16((orbital_position >> 16) as u16);
        w.write_u8(
            (self.west_east_flag as u8) << 7
                | self.polarization.bits() << 5
                | self.roll_off << 3
                | (self.dvb_s2 as u8) << 2
                | self.modulation_type,
        );
        w.write_u32(symbol_rate | self.fec_inner as u32);
        Ok(())
    }

    fn build_xml(&self, root: &mut Element) {
        root.set_int_attribute("frequency", self.frequency, false);
        root.set_attribute("orbital_position", format_orbital_position(self.orbital_position));
        root.set_enum_attribute(&names::DIRECTION, "west_east_flag", self.west_east_flag as u32);
        root.set_enum_attribute(
            &names::POLARIZATION,
            "polarization",
            self.polarization.bits() as u32,
        );
        root.set_enum_attribute(&names::ROLL_OFF, "roll_off", self.roll_off as u32);
        root.set_enum_attribute(
            &names::MODULATION_SYSTEM,
            "modulation_system",
            self.dvb_s2 as u32,
        );
        root.set_enum_attribute(
            &names::SATELLITE_MODULATION,
            "modulation_type",
            self.modulation_type as u32,
        );
        root.set_int_attribute("symbol_rate", self.symbol_rate, false);
        root.set_enum_attribute(&names::CODE_RATE, "FEC_inner", self.fec_inner as u32);
    }

    fn analyze_xml(element: &Element) -> Result<Self, XmlError> {
        let orbital_position = element
            .attribute("orbital_position")
            .and_then(parse_orbital_position)
            .filter(|&pos| pos <= 9999)
            .ok_or_else(|| match element.attribute("orbital_position") {
                Some(_) => element.invalid_attribute("orbital_position"),
                None => XmlError::MissingAttribute {
                    element: element.name().to_owned(),
                    attribute: "orbital_position",
                },
            })?;

        let desc = SatelliteDeliverySystemDescriptor {
            frequency: element.get_int("frequency")?,
            orbital_position,
            west_east_flag: element.get_enum(&names::DIRECTION, "west_east_flag", 0..=1)? != 0,
            polarization: Polarization::from_bits(element.get_enum(
                &names::POLARIZATION,
                "polarization",
                0..=3,
            )? as u8),
            roll_off: element.get_optional_enum(&names::ROLL_OFF, "roll_off", 0..=3, 0)? as u8,
            dvb_s2: element.get_optional_enum(
                &names::MODULATION_SYSTEM,
                "modulation_system",
                0..=1,
                0,
            )? != 0,
            modulation_type: element.get_optional_enum(
                &names::SATELLITE_MODULATION,
                "modulation_type",
                0..=3,
                1,
            )? as u8,
            symbol_rate: element.get_int("symbol_rate")?,
            fec_inner: element.get_enum(&names::CODE_RATE, "FEC_inner", 0..=15)? as u8,
        };
        desc.check_fields().map_err(|name| element.invalid_attribute(name))?;
        Ok(desc)
    }

    fn display_payload(disp: &mut TablesDisplay, data: &[u8]) {
        if data.len() < PAYLOAD_SIZE {
            disp.display_extra_data(data);
            return;
        }

        let mut r = Reader::new(data);
        let (Ok(frequency), Ok(orbital_position), Ok(flags), Ok(sr_fec)) =
            (r.read_u32(), r.read_u16(), r.read_u8(), r.read_u32())
        else {
            return;
        };

        let east = flags & 0b10000000 != 0;
        let polarization = (flags & 0b01100000) >> 5;
        let roll_off = (flags & 0b00011000) >> 3;
        let dvb_s2 = flags & 0b00000100 != 0;
        let modulation_type = flags & 0b00000011;
        let fec_inner = sr_fec & 0x0F;

        disp.line(format_args!(
            "Orbital position: {} degree, {}",
            format_bcd((orbital_position as u32) << 16, 4, 3),
            if east { "east" } else { "west" },
        ));
        disp.line(format_args!(
            "Frequency: {} GHz",
            format_bcd(frequency, 8, 3),
        ));
        disp.line(format_args!(
            "Symbol rate: {} Msymbol/s",
            format_bcd(sr_fec, 7, 3),
        ));
        disp.line(format_args!(
            "Polarization: {} ({})",
            polarization,
            names::POLARIZATION.name_or_value(polarization as u32),
        ));
        if dvb_s2 {
            disp.line(format_args!(
                "Delivery system: DVB-S2, roll off: {}",
                names::ROLL_OFF.name_or_value(roll_off as u32),
            ));
        } else {
            disp.line(format_args!("Delivery system: DVB-S"));
        }
        disp.line(format_args!(
            "Modulation: {} ({})",
            modulation_type,
            names::SATELLITE_MODULATION.name_or_value(modulation_type as u32),
        ));
        disp.line(format_args!(
            "Inner FEC: {} ({})",
            fec_inner,
            names::CODE_RATE.name_or_value(fec_inner),
        ));

        disp.display_extra_data(r.rest());
    }
}

//! 有線分配システム記述子。

use crate::cursor::{Reader, Writer};
use crate::display::TablesDisplay;
use crate::types::DeliverySystem;
use crate::utils::{decode_bcd, encode_bcd, format_bcd};
use crate::xml::{Element, XmlError};

use super::base::{DecodeError, Descriptor, EncodeError};
use super::edid::{tag, Edid};
use super::names;

const PAYLOAD_SIZE: usize = 11;

/// 周波数の単位（100Hz）。
const FREQUENCY_UNIT: u64 = 100;

/// シンボルレートの単位（100シンボル/秒）。
const SYMBOL_RATE_UNIT: u64 = 100;

/// 有線分配システム記述子。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CableDeliverySystemDescriptor {
    /// 周波数（単位はHz）。100Hzの倍数でなければならない。
    pub frequency: u64,
    /// FEC（外符号、4ビット）。
    pub fec_outer: u8,
    /// 変調。
    pub modulation: u8,
    /// シンボルレート（単位はシンボル/秒）。100の倍数でなければならない。
    pub symbol_rate: u64,
    /// FEC（内符号、4ビット）。
    pub fec_inner: u8,
}

impl CableDeliverySystemDescriptor {
    /// 分配システムの種類を返す。
    #[inline]
    pub fn delivery_system(&self) -> DeliverySystem {
        DeliverySystem::DvbC
    }

    /// 各フィールドが符号化できる値か検査し、不正な場合はそのXML属性名を返す。
    fn check_fields(&self) -> Result<(), &'static str> {
        if self.frequency % FREQUENCY_UNIT != 0 || self.frequency / FREQUENCY_UNIT > 99_999_999 {
            return Err("frequency");
        }
        if self.fec_outer > 0x0F {
            return Err("FEC_outer");
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

impl Descriptor for CableDeliverySystemDescriptor {
    const EDID: Edid = Edid::standard(tag::CABLE_DELIVERY);
    const XML_NAME: &'static str = "cable_delivery_system_descriptor";
    const DISPLAY_NAME: &'static str = "cable delivery system descriptor";

    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError> {
        if r.remaining() != PAYLOAD_SIZE {
            return Err(DecodeError::InvalidField("descriptor_length"));
        }

        let frequency =
            decode_bcd(r.read_u32()?, 8).ok_or(DecodeError::InvalidField("frequency"))?;
        let fec_outer = (r.read_u16()? & 0x000F) as u8;
        let modulation = r.read_u8()?;
        let sr_fec = r.read_u32()?;
        let symbol_rate =
            decode_bcd(sr_fec, 7).ok_or(DecodeError::InvalidField("symbol_rate"))?;
        let fec_inner = (sr_fec & 0x0F) as u8;

        Ok(CableDeliverySystemDescriptor {
            frequency: frequency as u64 * FREQUENCY_UNIT,
            fec_outer,
            modulation,
            symbol_rate: symbol_rate as u64 * SYMBOL_RATE_UNIT,
            fec_inner,
        })
    }

    fn validate(&self) -> Result<(), EncodeError> {
        self.check_fields().map_err(EncodeError::InvalidField)
    }

    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        let frequency = encode_bcd((self.frequency / FREQUENCY_UNIT) as u32, 8)
            .ok_or(EncodeError::InvalidField("frequency"))?;
        let symbol_rate = encode_bcd((self.symbol_rate / SYMBOL_RATE_UNIT) as u32, 7)
            .ok_or(EncodeError::InvalidField("symbol_rate"))?;

        w.write_u32(frequency);
        // reserved_future_use
        w.write_u16(0xFFF0 | self.fec_outer as u16);
        w.write_u8(self.modulation);
        w.write_u32(symbol_rate | self.fec_inner as u32);
        Ok(())
    }

    fn build_xml(&self, root: &mut Element) {
        root.set_int_attribute("frequency", self.frequency, false);
        root.set_enum_attribute(&names::OUTER_FEC, "FEC_outer", self.fec_outer as u32);
        root.set_enum_attribute(&names::CABLE_MODULATION, "modulation", self.modulation as u32);
        root.set_int_attribute("symbol_rate", self.symbol_rate, false);
        root.set_enum_attribute(&names::CODE_RATE, "FEC_inner", self.fec_inner as u32);
    }

    fn analyze_xml(element: &Element) -> Result<Self, XmlError> {
        let desc = CableDeliverySystemDescriptor {
            frequency: element.get_int("frequency")?,
            fec_outer: element.get_optional_enum(&names::OUTER_FEC, "FEC_outer", 0..=15, 2)? as u8,
            modulation: element.get_optional_enum(
                &names::CABLE_MODULATION,
                "modulation",
                0..=255,
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
        let (Ok(frequency), Ok(fec_outer), Ok(modulation), Ok(sr_fec)) =
            (r.read_u32(), r.read_u16(), r.read_u8(), r.read_u32())
        else {
            return;
        };
        let fec_outer = fec_outer & 0x000F;
        let fec_inner = sr_fec & 0x0F;

        disp.line(format_args!("Frequency: {} MHz", format_bcd(frequency, 8, 4)));
        disp.line(format_args!(
            "Symbol rate: {} Msymbol/s",
            format_bcd(sr_fec, 7, 3),
        ));
        disp.line(format_args!(
            "Modulation: {} ({}), Outer FEC: {}, Inner FEC: {}",
            modulation,
            names::CABLE_MODULATION.name_or_value(modulation as u32),
            names::OUTER_FEC.name_or_value(fec_outer as u32),
            names::CODE_RATE.name_or_value(fec_inner),
        ));
        disp.display_extra_data(r.rest());
    }
}

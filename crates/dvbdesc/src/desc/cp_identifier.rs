//! CP識別記述子。

use crate::cursor::{Reader, Writer};
use crate::display::TablesDisplay;
use crate::xml::{Element, XmlError};

use super::base::{DecodeError, Descriptor, EncodeError};
use super::edid::{xtag, Edid};

/// CP識別記述子。
///
/// サービスやイベントに適用されるコンテンツ保護方式を示す。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CpIdentifierDescriptor {
    /// CP方式識別。
    pub cpids: Vec<u16>,
}

impl CpIdentifierDescriptor {
    /// 1つの記述子に含められるCP方式識別の最大数。
    ///
    /// 内容の先頭1バイトは拡張タグで使われる。
    pub const MAX_ENTRIES: usize = 127;
}

impl Descriptor for CpIdentifierDescriptor {
    const EDID: Edid = Edid::extension(xtag::CP_IDENTIFIER);
    const XML_NAME: &'static str = "CP_identifier_descriptor";
    const DISPLAY_NAME: &'static str = "CP identifier descriptor";

    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError> {
        let mut cpids = Vec::with_capacity(r.remaining() / 2);
        while r.remaining() >= 2 {
            cpids.push(r.read_u16()?);
        }
        Ok(CpIdentifierDescriptor { cpids })
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.cpids.len() > Self::MAX_ENTRIES {
            return Err(EncodeError::TooManyEntries {
                count: self.cpids.len(),
                max: Self::MAX_ENTRIES,
            });
        }
        Ok(())
    }

    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        for &cpid in &self.cpids {
            w.write_u16(cpid);
        }
        Ok(())
    }

    fn build_xml(&self, root: &mut Element) {
        for &cpid in &self.cpids {
            root.add_element("CP_system_id")
                .set_int_attribute("value", cpid, true);
        }
    }

    fn analyze_xml(element: &Element) -> Result<Self, XmlError> {
        let cpids = element
            .get_children("CP_system_id", 0, Self::MAX_ENTRIES)?
            .into_iter()
            .map(|e| e.get_int::<u16>("value"))
            .collect::<Result<_, _>>()?;
        Ok(CpIdentifierDescriptor { cpids })
    }

    fn display_payload(disp: &mut TablesDisplay, data: &[u8]) {
        let mut chunks = data.chunks_exact(2);
        for chunk in &mut chunks {
            let cpid = u16::from_be_bytes([chunk[0], chunk[1]]);
            disp.line(format_args!("CP System Id: 0x{:04X} ({})", cpid, cpid));
        }
        disp.display_extra_data(chunks.remainder());
    }
}

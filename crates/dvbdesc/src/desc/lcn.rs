//! EACEMの論理チャンネル番号記述子。

use crate::cursor::{Reader, Writer};
use crate::display::TablesDisplay;
use crate::xml::{Element, XmlError};

use super::base::{DecodeError, Descriptor, EncodeError};
use super::edid::{pds, tag, Edid};

/// 論理チャンネル番号記述子の項目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalChannelNumberEntry {
    /// サービス識別。
    pub service_id: u16,
    /// サービスを選局画面に表示するかどうか。
    pub visible_service: bool,
    /// 論理チャンネル番号（10ビット）。
    pub logical_channel_number: u16,
}

/// EACEMの論理チャンネル番号記述子。
///
/// プライベートデータ指定子がEACEMの場合のみこの記述子として扱う。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogicalChannelNumberDescriptor {
    /// 論理チャンネル番号の項目。
    pub entries: Vec<LogicalChannelNumberEntry>,
}

impl LogicalChannelNumberDescriptor {
    /// 1つの記述子に含められる項目の最大数。
    pub const MAX_ENTRIES: usize = 63;

    /// 論理チャンネル番号の最大値。
    pub const MAX_CHANNEL_NUMBER: u16 = 0x03FF;
}

impl Descriptor for LogicalChannelNumberDescriptor {
    const EDID: Edid = Edid::private(tag::EACEM_LOGICAL_CHANNEL_NUMBER, pds::EACEM);
    const XML_NAME: &'static str = "eacem_logical_channel_number_descriptor";
    const DISPLAY_NAME: &'static str = "logical channel number descriptor";

    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError> {
        let mut entries = Vec::with_capacity(r.remaining() / 4);
        while r.remaining() >= 4 {
            let service_id = r.read_u16()?;
            let value = r.read_u16()?;
            entries.push(LogicalChannelNumberEntry {
                service_id,
                visible_service: value & 0x8000 != 0,
                logical_channel_number: value & Self::MAX_CHANNEL_NUMBER,
            });
        }
        Ok(LogicalChannelNumberDescriptor { entries })
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.entries.len() > Self::MAX_ENTRIES {
            return Err(EncodeError::TooManyEntries {
                count: self.entries.len(),
                max: Self::MAX_ENTRIES,
            });
        }
        if self
            .entries
            .iter()
            .any(|entry| entry.logical_channel_number > Self::MAX_CHANNEL_NUMBER)
        {
            return Err(EncodeError::InvalidField("logical_channel_number"));
        }
        Ok(())
    }

    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        for entry in &self.entries {
            w.write_u16(entry.service_id);
            // reservedは1
            w.write_u16(
                (entry.visible_service as u16) << 15 | 0x7C00 | entry.logical_channel_number,
            );
        }
        Ok(())
    }

    fn build_xml(&self, root: &mut Element) {
        for entry in &self.entries {
            let e = root.add_element("service");
            e.set_int_attribute("service_id", entry.service_id, true);
            e.set_int_attribute("logical_channel_number", entry.logical_channel_number, false);
            e.set_bool_attribute("visible_service", entry.visible_service);
        }
    }

    fn analyze_xml(element: &Element) -> Result<Self, XmlError> {
        let entries = element
            .get_children("service", 0, Self::MAX_ENTRIES)?
            .into_iter()
            .map(|e| -> Result<LogicalChannelNumberEntry, XmlError> {
                Ok(LogicalChannelNumberEntry {
                    service_id: e.get_int("service_id")?,
                    logical_channel_number: e.get_int_in(
                        "logical_channel_number",
                        0..=Self::MAX_CHANNEL_NUMBER as u64,
                    )? as u16,
                    visible_service: e.get_optional_bool("visible_service", true)?,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(LogicalChannelNumberDescriptor { entries })
    }

    fn display_payload(disp: &mut TablesDisplay, data: &[u8]) {
        let mut chunks = data.chunks_exact(4);
        for chunk in &mut chunks {
            let service_id = u16::from_be_bytes([chunk[0], chunk[1]]);
            let value = u16::from_be_bytes([chunk[2], chunk[3]]);
            disp.line(format_args!(
                "Service Id: {} (0x{:04X}), Visible: {}, Channel number: {}",
                service_id,
                service_id,
                value >> 15,
                value & Self::MAX_CHANNEL_NUMBER,
            ));
        }
        disp.display_extra_data(chunks.remainder());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn entry(service_id: u16, visible_service: bool, lcn: u16) -> LogicalChannelNumberEntry {
        LogicalChannelNumberEntry {
            service_id,
            visible_service,
            logical_channel_number: lcn,
        }
    }

    #[test]
    fn test_read() {
        let data = hex_literal::hex!("0001 FC01 0ABC 7C64");
        let desc = LogicalChannelNumberDescriptor::read(&data).unwrap();
        assert_eq!(desc.entries, [entry(1, true, 1), entry(0x0ABC, false, 100)]);

        // reservedは見ない
        let desc = LogicalChannelNumberDescriptor::read(&hex_literal::hex!("0001 8001")).unwrap();
        assert_eq!(desc.entries, [entry(1, true, 1)]);

        assert!(LogicalChannelNumberDescriptor::read(&data[..6]).is_none());
    }

    #[test]
    fn test_serialize() {
        let desc = LogicalChannelNumberDescriptor {
            entries: vec![entry(1, true, 1), entry(0x0ABC, false, 100)],
        };
        let buf = desc.serialize().unwrap();
        assert_eq!(buf.as_bytes(), hex_literal::hex!("83 08 0001 FC01 0ABC 7C64"));
        assert_eq!(buf.edid(pds::EACEM), LogicalChannelNumberDescriptor::EDID);

        let desc = LogicalChannelNumberDescriptor {
            entries: vec![entry(1, true, 1024)],
        };
        assert_matches!(
            desc.serialize(),
            Err(EncodeError::InvalidField("logical_channel_number"))
        );
        assert_matches!(
            desc.to_element(),
            Err(EncodeError::InvalidField("logical_channel_number"))
        );

        let desc = LogicalChannelNumberDescriptor {
            entries: vec![entry(1, true, 1); 64],
        };
        assert_matches!(
            desc.serialize(),
            Err(EncodeError::TooManyEntries { count: 64, max: 63 })
        );
        assert_matches!(
            desc.to_xml(&mut Element::new("descriptors")),
            Err(EncodeError::TooManyEntries { count: 64, max: 63 })
        );
    }

    #[test]
    fn test_xml() {
        let desc = LogicalChannelNumberDescriptor {
            entries: vec![entry(1, true, 1), entry(0x0ABC, false, 100)],
        };
        let element = desc.to_element().unwrap();
        assert_eq!(
            element.children()[1].attributes().collect::<Vec<_>>(),
            [
                ("service_id", "0x0ABC"),
                ("logical_channel_number", "100"),
                ("visible_service", "false"),
            ],
        );
        assert_eq!(LogicalChannelNumberDescriptor::from_xml(&element).unwrap(), desc);

        let element = Element::parse(
            r#"<eacem_logical_channel_number_descriptor>
              <service service_id="5" logical_channel_number="1024"/>
            </eacem_logical_channel_number_descriptor>"#,
        )
        .unwrap();
        assert_matches!(
            LogicalChannelNumberDescriptor::from_xml(&element),
            Err(XmlError::OutOfRange { value: 1024, max: 1023, .. })
        );
    }
}

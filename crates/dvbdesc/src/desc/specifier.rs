//! プライベートデータ指定記述子。

use crate::cursor::{Reader, Writer};
use crate::display::TablesDisplay;
use crate::utils::BytesExt;
use crate::xml::{Element, XmlError};

use super::base::{DecodeError, Descriptor, EncodeError};
use super::edid::{tag, Edid};
use super::names;

/// プライベートデータ指定記述子。
///
/// 記述子ループ内でこの記述子以降に現れるプライベート記述子の定義元を示す。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrivateDataSpecifierDescriptor {
    /// プライベートデータ指定子。
    pub private_data_specifier: u32,
}

impl Descriptor for PrivateDataSpecifierDescriptor {
    const EDID: Edid = Edid::standard(tag::PRIVATE_DATA_SPECIFIER);
    const XML_NAME: &'static str = "private_data_specifier_descriptor";
    const DISPLAY_NAME: &'static str = "private data specifier descriptor";

    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError> {
        let private_data_specifier = r.read_u32()?;
        Ok(PrivateDataSpecifierDescriptor {
            private_data_specifier,
        })
    }

    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_u32(self.private_data_specifier);
        Ok(())
    }

    fn build_xml(&self, root: &mut Element) {
        root.set_enum_attribute(
            &names::PRIVATE_DATA_SPECIFIER,
            "private_data_specifier",
            self.private_data_specifier,
        );
    }

    fn analyze_xml(element: &Element) -> Result<Self, XmlError> {
        let private_data_specifier = element.get_enum(
            &names::PRIVATE_DATA_SPECIFIER,
            "private_data_specifier",
            0..=u32::MAX,
        )?;
        Ok(PrivateDataSpecifierDescriptor {
            private_data_specifier,
        })
    }

    fn display_payload(disp: &mut TablesDisplay, data: &[u8]) {
        if data.len() < 4 {
            disp.display_extra_data(data);
            return;
        }

        let pds = data[0..=3].read_be_32();
        disp.line(format_args!(
            "Specifier: 0x{:08X} ({})",
            pds,
            names::PRIVATE_DATA_SPECIFIER.name(pds).unwrap_or("unknown"),
        ));
        disp.display_extra_data(&data[4..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::pds;

    #[test]
    fn test_read() {
        let desc = PrivateDataSpecifierDescriptor::read(&[0x00, 0x00, 0x23, 0x3A]).unwrap();
        assert_eq!(desc.private_data_specifier, pds::OFCOM);

        assert!(PrivateDataSpecifierDescriptor::read(&[0x00, 0x00, 0x28]).is_none());
        assert!(PrivateDataSpecifierDescriptor::read(&[0x00, 0x00, 0x00, 0x28, 0x00]).is_none());
    }

    #[test]
    fn test_round_trip() {
        let desc = PrivateDataSpecifierDescriptor {
            private_data_specifier: pds::EACEM,
        };
        let buf = desc.serialize().unwrap();
        assert_eq!(buf.as_bytes(), hex_literal::hex!("5F 04 00000028"));

        let element = desc.to_element().unwrap();
        assert_eq!(element.attribute("private_data_specifier"), Some("EACEM"));
        assert_eq!(PrivateDataSpecifierDescriptor::from_xml(&element).unwrap(), desc);

        let element = Element::parse(
            r#"<private_data_specifier_descriptor private_data_specifier="0x12345678"/>"#,
        )
        .unwrap();
        assert_eq!(
            PrivateDataSpecifierDescriptor::from_xml(&element)
                .unwrap()
                .private_data_specifier,
            0x12345678,
        );
    }
}

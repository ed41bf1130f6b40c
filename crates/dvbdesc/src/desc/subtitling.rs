//! 字幕記述子。

use crate::cursor::{encode_fixed_string, Reader, Writer};
use crate::display::TablesDisplay;
use crate::xml::{Element, XmlError};

use super::base::{DecodeError, Descriptor, EncodeError};
use super::edid::{tag, Edid};
use super::names;

/// 字幕記述子の項目。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubtitlingEntry {
    /// ISO 639の3文字の言語コード。
    pub language_code: String,
    /// 字幕の種類。
    pub subtitling_type: u8,
    /// コンポジションページID。
    pub composition_page_id: u16,
    /// 補助ページID。
    pub ancillary_page_id: u16,
}

impl SubtitlingEntry {
    /// 項目1つのバイト数。
    pub const SIZE: usize = 8;
}

/// 字幕記述子。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubtitlingDescriptor {
    /// 字幕の項目。
    pub entries: Vec<SubtitlingEntry>,
}

impl SubtitlingDescriptor {
    /// 1つの記述子に含められる項目の最大数。
    pub const MAX_ENTRIES: usize = 31;
}

impl Descriptor for SubtitlingDescriptor {
    const EDID: Edid = Edid::standard(tag::SUBTITLING);
    const XML_NAME: &'static str = "subtitling_descriptor";
    const DISPLAY_NAME: &'static str = "subtitling descriptor";

    fn read_payload(r: &mut Reader) -> Result<Self, DecodeError> {
        // 項目の途中で終わっていれば読み残しとして無効になる
        let mut entries = Vec::with_capacity(r.remaining() / SubtitlingEntry::SIZE);
        while r.remaining() >= SubtitlingEntry::SIZE {
            entries.push(SubtitlingEntry {
                language_code: r.read_fixed_string(3)?,
                subtitling_type: r.read_u8()?,
                composition_page_id: r.read_u16()?,
                ancillary_page_id: r.read_u16()?,
            });
        }

        Ok(SubtitlingDescriptor { entries })
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
            .any(|entry| encode_fixed_string(&entry.language_code, 3).is_none())
        {
            return Err(EncodeError::InvalidField("language_code"));
        }
        Ok(())
    }

    fn write_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        for entry in &self.entries {
            if !w.write_fixed_string(&entry.language_code, 3) {
                return Err(EncodeError::InvalidField("language_code"));
            }
            w.write_u8(entry.subtitling_type);
            w.write_u16(entry.composition_page_id);
            w.write_u16(entry.ancillary_page_id);
        }
        Ok(())
    }

    fn build_xml(&self, root: &mut Element) {
        for entry in &self.entries {
            let e = root.add_element("subtitling");
            e.set_attribute("language_code", entry.language_code.as_str());
            e.set_int_attribute("subtitling_type", entry.subtitling_type, true);
            e.set_int_attribute("composition_page_id", entry.composition_page_id, true);
            e.set_int_attribute("ancillary_page_id", entry.ancillary_page_id, true);
        }
    }

    fn analyze_xml(element: &Element) -> Result<Self, XmlError> {
        let entries = element
            .get_children("subtitling", 0, Self::MAX_ENTRIES)?
            .into_iter()
            .map(|e| -> Result<SubtitlingEntry, XmlError> {
                Ok(SubtitlingEntry {
                    language_code: e.get_fixed_string("language_code", 3)?,
                    subtitling_type: e.get_int("subtitling_type")?,
                    composition_page_id: e.get_int("composition_page_id")?,
                    ancillary_page_id: e.get_int("ancillary_page_id")?,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(SubtitlingDescriptor { entries })
    }

    fn display_payload(disp: &mut TablesDisplay, data: &[u8]) {
        let mut chunks = data.chunks_exact(SubtitlingEntry::SIZE);
        for chunk in &mut chunks {
            let language: String = chunk[..3]
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            let subtitling_type = chunk[3];
            let composition_page_id = u16::from_be_bytes([chunk[4], chunk[5]]);
            let ancillary_page_id = u16::from_be_bytes([chunk[6], chunk[7]]);

            disp.line(format_args!(
                "Language: {}, Type: {} (0x{:02X})",
                language, subtitling_type, subtitling_type,
            ));
            disp.line(format_args!(
                "Type: {}",
                names::SUBTITLING_TYPE.name_or_value(subtitling_type as u32),
            ));
            disp.line(format_args!(
                "Composition page: {} (0x{:04X}), Ancillary page: {} (0x{:04X})",
                composition_page_id, composition_page_id, ancillary_page_id, ancillary_page_id,
            ));
        }

        disp.display_extra_data(chunks.remainder());
    }
}

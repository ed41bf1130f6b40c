//! 記述子の識別子やXMLの要素名から記述子を生成するための登録表。
//!
//! 登録表は[`RegistryBuilder`]で構築した後は変更されない。
//! 既定の記述子を登録した登録表は[`init`]で一度だけ構築され、[`global`]で参照できる。

use std::fmt;
use std::sync::OnceLock;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use thiserror::Error;

use crate::desc::{
    AnyDescriptor, CableDeliverySystemDescriptor, CpIdentifierDescriptor, DecodeError,
    Descriptor, DescriptorBlock, DescriptorBuf, Edid, EncodeError,
    LogicalChannelNumberDescriptor, PrivateDataSpecifierDescriptor, RawDescriptor,
    SatelliteDeliverySystemDescriptor, SubtitlingDescriptor,
};
use crate::display::TablesDisplay;
use crate::utils::HexBytes;
use crate::xml::{parse_hex, Element, XmlError};

/// 未登録の記述子や無効な記述子を表すXMLの要素名。
pub const GENERIC_XML_NAME: &str = "generic_descriptor";

/// 記述子の内容から型消去した記述子を生成する関数。
pub type ReadFn = fn(&[u8]) -> Result<Box<dyn AnyDescriptor>, DecodeError>;

/// XMLの要素から型消去した記述子を生成する関数。
pub type XmlFn = fn(&Element) -> Result<Box<dyn AnyDescriptor>, XmlError>;

/// 記述子の内容を表示する関数。
pub type DisplayFn = fn(&mut TablesDisplay, &[u8]);

/// 登録表の構築で発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 同じ識別子が既に登録されている。
    #[error("descriptor {0} is already registered")]
    DuplicateEdid(Edid),

    /// 同じXMLの要素名が既に登録されている。
    #[error("XML element <{0}> is already registered")]
    DuplicateXmlName(&'static str),
}

/// 1種類の記述子をバイナリ形式から生成・表示するための関数群。
#[derive(Clone, Copy)]
pub struct DescriptorFactory {
    edid: Edid,
    display_name: &'static str,
    xml_name: &'static str,
    read: ReadFn,
    display: DisplayFn,
}

impl DescriptorFactory {
    /// 各関数から`DescriptorFactory`を生成する。
    pub fn new(
        edid: Edid,
        display_name: &'static str,
        xml_name: &'static str,
        read: ReadFn,
        display: DisplayFn,
    ) -> DescriptorFactory {
        DescriptorFactory {
            edid,
            display_name,
            xml_name,
            read,
            display,
        }
    }

    /// 記述子`T`の`DescriptorFactory`を生成する。
    pub fn of<T: Descriptor>() -> DescriptorFactory {
        DescriptorFactory::new(
            T::EDID,
            T::DISPLAY_NAME,
            T::XML_NAME,
            read_boxed::<T>,
            T::display,
        )
    }

    /// 記述子の識別子を返す。
    #[inline]
    pub fn edid(&self) -> Edid {
        self.edid
    }

    /// 表示用の名前を返す。
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// XMLの要素名を返す。
    #[inline]
    pub fn xml_name(&self) -> &'static str {
        self.xml_name
    }

    /// `descriptor_tag`と`descriptor_length`を除いた`data`から記述子を読み取る。
    #[inline]
    pub fn read(&self, data: &[u8]) -> Result<Box<dyn AnyDescriptor>, DecodeError> {
        (self.read)(data)
    }

    /// `descriptor_tag`と`descriptor_length`を除いた`data`を表示する。
    #[inline]
    pub fn display(&self, disp: &mut TablesDisplay, data: &[u8]) {
        (self.display)(disp, data)
    }
}

impl fmt::Debug for DescriptorFactory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DescriptorFactory")
            .field("edid", &self.edid)
            .field("display_name", &self.display_name)
            .field("xml_name", &self.xml_name)
            .finish_non_exhaustive()
    }
}

fn read_boxed<T: Descriptor>(data: &[u8]) -> Result<Box<dyn AnyDescriptor>, DecodeError> {
    let desc = T::decode(data)?;
    Ok(Box::new(desc))
}

fn from_xml_boxed<T: Descriptor>(element: &Element) -> Result<Box<dyn AnyDescriptor>, XmlError> {
    let desc = T::from_xml(element)?;
    Ok(Box::new(desc))
}

/// [`Registry`]を構築する。
#[derive(Default)]
pub struct RegistryBuilder {
    binary: IndexMap<Edid, DescriptorFactory, FxBuildHasher>,
    xml: IndexMap<String, (&'static str, XmlFn), FxBuildHasher>,
}

impl RegistryBuilder {
    /// 空の`RegistryBuilder`を生成する。
    #[inline]
    pub fn new() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// バイナリ形式からの生成関数を登録する。
    pub fn register_binary(
        &mut self,
        factory: DescriptorFactory,
    ) -> Result<&mut Self, RegistryError> {
        if self.binary.contains_key(&factory.edid) {
            return Err(RegistryError::DuplicateEdid(factory.edid));
        }

        log::trace!("register {} as {}", factory.display_name, factory.edid);
        self.binary.insert(factory.edid, factory);
        Ok(self)
    }

    /// XMLからの生成関数を登録する。要素名の大文字小文字は区別しない。
    pub fn register_xml(
        &mut self,
        name: &'static str,
        from_xml: XmlFn,
    ) -> Result<&mut Self, RegistryError> {
        let key = name.to_ascii_lowercase();
        if self.xml.contains_key(&key) || key == GENERIC_XML_NAME {
            return Err(RegistryError::DuplicateXmlName(name));
        }

        log::trace!("register <{}>", name);
        self.xml.insert(key, (name, from_xml));
        Ok(self)
    }

    /// 記述子`T`をバイナリ形式とXMLの両方で登録する。
    ///
    /// どちらかが重複している場合は何も登録せずにエラーを返す。
    pub fn register<T: Descriptor>(&mut self) -> Result<&mut Self, RegistryError> {
        if self.binary.contains_key(&T::EDID) {
            return Err(RegistryError::DuplicateEdid(T::EDID));
        }

        self.register_xml(T::XML_NAME, from_xml_boxed::<T>)?;
        self.register_binary(DescriptorFactory::of::<T>())
    }

    /// 登録表を構築する。
    pub fn build(self) -> Registry {
        Registry {
            binary: self.binary,
            xml: self.xml,
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("binary", &self.binary.keys())
            .field("xml", &self.xml.keys())
            .finish()
    }
}

/// 記述子の生成関数の登録表。
pub struct Registry {
    binary: IndexMap<Edid, DescriptorFactory, FxBuildHasher>,
    xml: IndexMap<String, (&'static str, XmlFn), FxBuildHasher>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("binary", &self.binary.keys())
            .field("xml", &self.xml.keys())
            .finish()
    }
}

impl Registry {
    /// このクレートの記述子をすべて登録した登録表を構築する。
    pub fn with_defaults() -> Result<Registry, RegistryError> {
        let mut builder = RegistryBuilder::new();
        builder
            .register::<SatelliteDeliverySystemDescriptor>()?
            .register::<CableDeliverySystemDescriptor>()?
            .register::<SubtitlingDescriptor>()?
            .register::<PrivateDataSpecifierDescriptor>()?
            .register::<CpIdentifierDescriptor>()?
            .register::<LogicalChannelNumberDescriptor>()?;
        Ok(builder.build())
    }

    /// `edid`に対応する生成関数を返す。
    #[inline]
    pub fn lookup_binary(&self, edid: Edid) -> Option<&DescriptorFactory> {
        self.binary.get(&edid)
    }

    /// XMLの要素名`name`に対応する生成関数を返す。
    pub fn lookup_xml(&self, name: &str) -> Option<XmlFn> {
        self.xml
            .get(&name.to_ascii_lowercase())
            .map(|&(_, from_xml)| from_xml)
    }

    /// 登録された記述子を登録順に返す。
    pub fn iter(&self) -> impl Iterator<Item = &DescriptorFactory> {
        self.binary.values()
    }

    /// 登録されたXMLの要素名を登録順に返す。
    pub fn xml_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.xml.values().map(|&(name, _)| name)
    }

    /// `descriptor_tag`と`descriptor_length`を除いた`payload`を`edid`の記述子として読み取る。
    pub fn decode(&self, edid: Edid, payload: &[u8]) -> Decoded {
        let Some(factory) = self.lookup_binary(edid) else {
            return Decoded::Unknown {
                edid,
                payload: payload.to_vec(),
            };
        };

        match factory.read(payload) {
            Ok(desc) => Decoded::Known(desc),
            Err(e) => {
                log::debug!("invalid {}: {}", factory.xml_name, e);
                Decoded::Invalid {
                    edid,
                    payload: payload.to_vec(),
                }
            }
        }
    }

    /// `pds`をプライベートデータ指定子として`raw`を読み取る。
    #[inline]
    pub fn decode_raw(&self, raw: &RawDescriptor, pds: u32) -> Decoded {
        self.decode(raw.edid(pds), raw.data)
    }

    /// 記述子ループ内の記述子をすべて読み取る。
    ///
    /// `default_pds`は記述子ループの先頭で有効なプライベートデータ指定子。
    pub fn decode_block(&self, block: &DescriptorBlock, default_pds: u32) -> Vec<Decoded> {
        block
            .classify(default_pds)
            .map(|(edid, raw)| self.decode(edid, raw.data))
            .collect()
    }

    /// XMLの要素から記述子を読み取る。
    ///
    /// `generic_descriptor`要素はバイナリ形式として読み取った上で、登録された記述子であれば変換する。
    pub fn from_xml(&self, element: &Element) -> Result<Decoded, XmlError> {
        if element.has_name(GENERIC_XML_NAME) {
            let tag = element.get_int::<u8>("tag")?;
            let payload =
                parse_hex(element.text()).ok_or_else(|| XmlError::InvalidHex(GENERIC_XML_NAME.to_owned()))?;
            if payload.len() > DescriptorBuf::MAX_PAYLOAD_SIZE {
                return Err(XmlError::InvalidLength {
                    element: GENERIC_XML_NAME.to_owned(),
                    attribute: "content",
                    len: payload.len(),
                    min: 0,
                    max: DescriptorBuf::MAX_PAYLOAD_SIZE,
                });
            }

            let pds = element.get_optional_int::<u32>("private_data_specifier", 0)?;
            return Ok(self.decode(Edid::classify(tag, &payload, pds), &payload));
        }

        let Some(from_xml) = self.lookup_xml(element.name()) else {
            log::warn!("unknown XML element <{}>", element.name());
            return Err(XmlError::UnknownElement(element.name().to_owned()));
        };
        Ok(Decoded::Known(from_xml(element)?))
    }
}

/// 型を消去した状態で読み取った記述子。
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// 登録された記述子として読み取れた。
    Known(Box<dyn AnyDescriptor>),

    /// 登録された記述子だが内容が不正。
    ///
    /// バイナリ形式にもXMLにも変換できない。
    Invalid {
        /// 記述子の識別子。
        edid: Edid,
        /// 記述子の内容。
        payload: Vec<u8>,
    },

    /// 登録されていない記述子。
    ///
    /// 内容をそのまま保持し、変換時にはそのまま出力する。
    Unknown {
        /// 記述子の識別子。
        edid: Edid,
        /// 記述子の内容。
        payload: Vec<u8>,
    },
}

impl Decoded {
    /// 無効な記述子でなければ`true`を返す。
    #[inline]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Decoded::Invalid { .. })
    }

    /// 記述子の識別子を返す。
    pub fn edid(&self) -> Edid {
        match self {
            Decoded::Known(desc) => desc.edid(),
            Decoded::Invalid { edid, .. } | Decoded::Unknown { edid, .. } => *edid,
        }
    }

    /// 記述子`T`として読み取れていれば参照を返す。
    pub fn downcast_ref<T: Descriptor>(&self) -> Option<&T> {
        match self {
            Decoded::Known(desc) => desc.downcast_ref(),
            _ => None,
        }
    }

    /// `descriptor_tag`と`descriptor_length`を含むバイナリ形式に変換する。
    pub fn serialize(&self) -> Result<DescriptorBuf, EncodeError> {
        match self {
            Decoded::Known(desc) => desc.to_binary(),
            Decoded::Invalid { .. } => Err(EncodeError::Invalid),
            Decoded::Unknown { edid, payload } => DescriptorBuf::new(edid.tag(), payload),
        }
    }

    /// `parent`の子要素としてこの記述子の要素を追加し、その要素を返す。
    ///
    /// 登録されていない記述子は`generic_descriptor`要素になる。
    pub fn to_xml<'e>(&self, parent: &'e mut Element) -> Result<&'e mut Element, EncodeError> {
        match self {
            Decoded::Known(desc) => desc.append_xml(parent),
            Decoded::Invalid { .. } => Err(EncodeError::Invalid),
            Decoded::Unknown { edid, payload } => {
                let element = parent.add_element(GENERIC_XML_NAME);
                element.set_int_attribute("tag", edid.tag(), true);
                if let Some(pds) = edid.pds() {
                    element.set_int_attribute("private_data_specifier", pds, true);
                }
                element.set_text(HexBytes(payload).to_string());
                Ok(element)
            }
        }
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// 既定の記述子を登録した登録表を構築する。
///
/// 2回目以降の呼び出しでは構築済みの登録表を返す。
pub fn init() -> Result<&'static Registry, RegistryError> {
    if let Some(registry) = GLOBAL.get() {
        return Ok(registry);
    }

    let registry = Registry::with_defaults()?;
    Ok(GLOBAL.get_or_init(|| registry))
}

/// 既定の記述子を登録した登録表を返す。
///
/// # パニック
///
/// 既定の記述子の登録が重複している場合はパニックする。
pub fn global() -> &'static Registry {
    match init() {
        Ok(registry) => registry,
        Err(e) => panic!("failed to build the descriptor registry: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::{pds, tag, xtag, SubtitlingEntry};
    use assert_matches::assert_matches;

    #[test]
    fn test_registry_defaults() {
        let registry = Registry::with_defaults().unwrap();
        assert_eq!(registry.iter().count(), 6);
        assert_eq!(registry.xml_names().count(), 6);

        let factory = registry.lookup_binary(Edid::standard(tag::SUBTITLING)).unwrap();
        assert_eq!(factory.xml_name(), "subtitling_descriptor");
        assert!(registry.lookup_xml("SUBTITLING_DESCRIPTOR").is_some());

        assert!(registry.lookup_binary(Edid::extension(xtag::CP_IDENTIFIER)).is_some());
        assert!(registry
            .lookup_binary(Edid::private(tag::EACEM_LOGICAL_CHANNEL_NUMBER, pds::EACEM))
            .is_some());
        // プライベートデータ指定子が異なれば別の記述子
        assert!(registry
            .lookup_binary(Edid::private(tag::EACEM_LOGICAL_CHANNEL_NUMBER, pds::NORDIG))
            .is_none());
    }

    #[test]
    fn test_registry_unknown() {
        let registry = Registry::with_defaults().unwrap();
        assert!(registry.lookup_binary(Edid::standard(0xF0)).is_none());
        assert!(registry.lookup_binary(Edid::extension(0x7E)).is_none());
        assert!(registry.lookup_xml("no_such_descriptor").is_none());

        let decoded = registry.decode(Edid::standard(0xF0), &[0x01, 0x02]);
        assert!(decoded.is_valid());
        assert_eq!(decoded.edid(), Edid::standard(0xF0));
        assert_eq!(decoded.serialize().unwrap().as_bytes(), [0xF0, 0x02, 0x01, 0x02]);

        let mut root = Element::new("root");
        decoded.to_xml(&mut root).unwrap();
        let xml = root.to_xml_string().unwrap();
        assert!(xml.contains(r#"<generic_descriptor tag="0xF0">01 02</generic_descriptor>"#));

        let element = &root.children()[0];
        assert_eq!(registry.from_xml(element).unwrap(), decoded);

        let e = registry.from_xml(&Element::new("no_such_descriptor"));
        assert_matches!(e, Err(XmlError::UnknownElement(name)) if name == "no_such_descriptor");
    }

    #[test]
    fn test_registry_duplicate() {
        let mut builder = RegistryBuilder::new();
        builder.register::<SubtitlingDescriptor>().unwrap();
        assert_matches!(
            builder.register::<SubtitlingDescriptor>(),
            Err(RegistryError::DuplicateEdid(edid)) if edid == Edid::standard(tag::SUBTITLING)
        );

        fn dummy(_: &Element) -> Result<Box<dyn AnyDescriptor>, XmlError> {
            Err(XmlError::Malformed("dummy"))
        }
        assert_matches!(
            builder.register_xml("Subtitling_Descriptor", dummy),
            Err(RegistryError::DuplicateXmlName("Subtitling_Descriptor"))
        );
        assert_matches!(
            builder.register_xml(GENERIC_XML_NAME, dummy),
            Err(RegistryError::DuplicateXmlName(_))
        );

        let registry = builder.build();
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn test_registry_invalid() {
        let registry = Registry::with_defaults().unwrap();
        let decoded = registry.decode(Edid::standard(tag::SUBTITLING), &[0; 9]);
        assert!(!decoded.is_valid());
        assert_matches!(decoded.serialize(), Err(EncodeError::Invalid));
        assert_matches!(decoded.to_xml(&mut Element::new("root")), Err(EncodeError::Invalid));
    }

    #[test]
    fn test_known_unencodable() {
        let desc = SubtitlingDescriptor {
            entries: vec![SubtitlingEntry {
                language_code: "en".to_owned(),
                ..Default::default()
            }],
        };
        let decoded = Decoded::Known(Box::new(desc));
        let mut root = Element::new("root");
        assert_matches!(
            decoded.serialize(),
            Err(EncodeError::InvalidField("language_code"))
        );
        assert_matches!(
            decoded.to_xml(&mut root),
            Err(EncodeError::InvalidField("language_code"))
        );
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_registry_equivalence() {
        let registry = Registry::with_defaults().unwrap();
        let desc = SubtitlingDescriptor {
            entries: vec![SubtitlingEntry {
                language_code: "fra".to_owned(),
                subtitling_type: 0x10,
                composition_page_id: 1,
                ancillary_page_id: 2,
            }],
        };

        // バイナリ形式から読んだ記述子とXMLから読んだ記述子は等しい
        let buf = desc.serialize().unwrap();
        let from_binary = registry.decode_raw(&buf.as_raw(), 0);
        let element = desc.to_element().unwrap();
        let from_xml = registry.from_xml(&element).unwrap();
        assert_eq!(from_binary, from_xml);
        assert_eq!(from_binary.downcast_ref::<SubtitlingDescriptor>(), Some(&desc));
        assert_eq!(from_xml.serialize().unwrap(), buf);

        let xml = Element::parse(
            r#"<generic_descriptor tag="0x59">66 72 61 10 00 01 00 02</generic_descriptor>"#,
        )
        .unwrap();
        assert_eq!(registry.from_xml(&xml).unwrap(), from_binary);
    }

    #[test]
    fn test_decode_block() {
        let registry = Registry::with_defaults().unwrap();
        let block = DescriptorBlock::new(&hex_literal::hex!("83 04 0001 FC01 F0 00"));

        let decoded = registry.decode_block(&block, pds::EACEM);
        assert_eq!(decoded.len(), 2);
        assert_matches!(
            decoded[0].downcast_ref::<LogicalChannelNumberDescriptor>(),
            Some(lcn) if lcn.entries.len() == 1
        );
        assert_matches!(&decoded[1], Decoded::Unknown { edid, payload } if edid.tag() == 0xF0 && payload.is_empty());

        // プライベートデータ指定子がなければ登録されていない記述子
        let decoded = registry.decode_block(&block, 0);
        assert_matches!(&decoded[0], Decoded::Unknown { .. });
    }

    #[test]
    fn test_global() {
        let registry = global();
        assert!(std::ptr::eq(registry, init().unwrap()));
        assert!(registry.lookup_binary(Edid::standard(tag::SATELLITE_DELIVERY)).is_some());
    }
}

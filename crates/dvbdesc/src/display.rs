//! 記述子を人が読める形式で表示する。
//!
//! 表示は壊れたバイト列に対しても失敗しない。
//! 解釈できない部分は16進数とASCIIで出力する。

use std::fmt::{self, Write};

use crate::context::Context;
use crate::desc::{tag, DescriptorBlock, Edid, RawDescriptor};
use crate::registry::Registry;
use crate::utils::BytesExt;

/// 16進ダンプの1行あたりのバイト数。
const DUMP_WIDTH: usize = 16;

/// 入れ子ごとに増やす字下げ幅。
const INDENT_STEP: usize = 2;

/// 記述子の表示先。
///
/// 出力は内部の`String`に蓄積され、[`output`](TablesDisplay::output)で取得する。
#[derive(Debug)]
pub struct TablesDisplay<'r> {
    registry: &'r Registry,
    default_pds: u32,
    margin: usize,
    out: String,
}

impl<'r> TablesDisplay<'r> {
    /// `registry`に登録された表示関数を使う`TablesDisplay`を生成する。
    pub fn new(registry: &'r Registry, ctx: &Context) -> TablesDisplay<'r> {
        TablesDisplay {
            registry,
            default_pds: ctx.default_pds,
            margin: ctx.indent,
            out: String::new(),
        }
    }

    /// 使用している[`Registry`]を返す。
    #[inline]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// 現在の字下げ幅を返す。
    #[inline]
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// これまでの出力を返す。
    #[inline]
    pub fn output(&self) -> &str {
        &self.out
    }

    /// 出力を取り出す。
    #[inline]
    pub fn into_string(self) -> String {
        self.out
    }

    /// 字下げして1行を出力する。
    pub fn line(&mut self, args: fmt::Arguments) {
        self.out.extend(std::iter::repeat(' ').take(self.margin));
        // Stringへの書き込みは失敗しない
        let _ = self.out.write_fmt(args);
        self.out.push('\n');
    }

    /// 字下げを1段深くして`f`を実行する。
    pub fn indented<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.margin += INDENT_STEP;
        f(self);
        self.margin -= INDENT_STEP;
    }

    /// `data`を16進数とASCIIで出力する。
    pub fn hex_dump(&mut self, data: &[u8]) {
        for chunk in data.chunks(DUMP_WIDTH) {
            let mut hex = String::with_capacity(DUMP_WIDTH * 3);
            for (i, b) in chunk.iter().enumerate() {
                if i != 0 {
                    hex.push(' ');
                }
                let _ = write!(hex, "{:02X}", b);
            }
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            self.line(format_args!("{:<width$}  {}", hex, ascii, width = DUMP_WIDTH * 3 - 1));
        }
    }

    /// 記述子の解釈できなかった残りのデータを出力する。
    ///
    /// `data`が空の場合は何も出力しない。
    pub fn display_extra_data(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        self.line(format_args!("Extraneous {} bytes:", data.len()));
        self.indented(|disp| disp.hex_dump(data));
    }

    /// `descriptor_tag`と`descriptor_length`を含む`data`から記述子を1つ表示する。
    ///
    /// 表示したバイト数を返す。`data`が記述子長に満たない場合はその旨を表示して`data`の長さを返す。
    pub fn display_descriptor(&mut self, index: usize, data: &[u8], pds: u32) -> usize {
        let [tag, length, ref rem @ ..] = *data else {
            self.line(format_args!(
                "- Descriptor {}: truncated, {} bytes",
                index,
                data.len()
            ));
            self.indented(|disp| disp.hex_dump(data));
            return data.len();
        };

        if rem.len() < length as usize {
            self.line(format_args!(
                "- Descriptor {}: Tag {} (0x{:02X}), {} bytes, truncated to {} bytes",
                index,
                tag,
                tag,
                length,
                rem.len()
            ));
            self.indented(|disp| disp.hex_dump(rem));
            return data.len();
        }

        let raw = RawDescriptor {
            tag,
            data: &rem[..length as usize],
        };
        self.display_raw_descriptor(index, raw.edid(pds), raw);
        2 + length as usize
    }

    /// 判別済みの記述子を表示する。
    ///
    /// `edid`が登録されていない場合は内容を16進数で表示する。
    pub fn display_raw_descriptor(&mut self, index: usize, edid: Edid, raw: RawDescriptor) {
        let registry = self.registry;
        let factory = registry.lookup_binary(edid);
        let name = factory.map_or("unknown descriptor", |f| f.display_name());
        self.line(format_args!(
            "- Descriptor {}: {}, Tag {} (0x{:02X}), {} bytes",
            index,
            name,
            raw.tag,
            raw.tag,
            raw.data.len()
        ));

        self.indented(|disp| match factory {
            Some(f) => f.display(disp, raw.data),
            None => disp.hex_dump(raw.data),
        });
    }

    /// 記述子ループを表示する。
    ///
    /// プライベートデータ指定記述子を追跡し、以降の記述子の判別に使う。
    /// 壊れた記述子に到達した場合はその記述子を表示して終了する。
    pub fn display_descriptor_list(&mut self, block: &DescriptorBlock) {
        let mut pds = self.default_pds;
        let mut data = block.as_bytes();
        let mut index = 0;
        while !data.is_empty() {
            let size = self.display_descriptor(index, data, pds);
            let desc = &data[..size];
            if size >= 6 && desc[0] == tag::PRIVATE_DATA_SPECIFIER && desc[1] >= 4 {
                pds = desc[2..].read_be_32();
            }

            data = &data[size..];
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display<F: FnOnce(&mut TablesDisplay)>(f: F) -> String {
        let registry = Registry::with_defaults().unwrap();
        let mut disp = TablesDisplay::new(&registry, &Context::new());
        f(&mut disp);
        disp.into_string()
    }

    #[test]
    fn test_line() {
        let out = display(|disp| {
            disp.line(format_args!("a{}", 1));
            disp.indented(|disp| disp.line(format_args!("b")));
            disp.line(format_args!("c"));
        });
        assert_eq!(out, "a1\n  b\nc\n");
    }

    #[test]
    fn test_extra_data() {
        let out = display(|disp| disp.display_extra_data(&[]));
        assert_eq!(out, "");

        let out = display(|disp| disp.display_extra_data(b"AB\x00"));
        assert_eq!(
            out,
            concat!(
                "Extraneous 3 bytes:\n",
                "  41 42 00                                         AB.\n",
            ),
        );

        let data: Vec<u8> = (0x30..0x41).collect();
        let out = display(|disp| disp.hex_dump(&data));
        assert_eq!(
            out,
            concat!(
                "30 31 32 33 34 35 36 37 38 39 3A 3B 3C 3D 3E 3F  0123456789:;<=>?\n",
                "40                                               @\n",
            ),
        );
    }

    #[test]
    fn test_display_descriptor_truncated() {
        let out = display(|disp| {
            assert_eq!(disp.display_descriptor(0, &[0x59], 0), 1);
        });
        assert_eq!(out, "- Descriptor 0: truncated, 1 bytes\n  59                                               Y\n");

        let out = display(|disp| {
            assert_eq!(disp.display_descriptor(3, &[0x59, 0x08, 0x65], 0), 3);
        });
        assert_eq!(
            out,
            concat!(
                "- Descriptor 3: Tag 89 (0x59), 8 bytes, truncated to 1 bytes\n",
                "  65                                               e\n",
            ),
        );
    }

    #[test]
    fn test_display_descriptor_unknown() {
        let out = display(|disp| {
            assert_eq!(disp.display_descriptor(0, &[0xF0, 0x02, 0x01, 0x02, 0xFF], 0), 4);
        });
        assert_eq!(
            out,
            concat!(
                "- Descriptor 0: unknown descriptor, Tag 240 (0xF0), 2 bytes\n",
                "  01 02                                            ..\n",
            ),
        );
    }

    #[test]
    fn test_display_descriptor_list() {
        let block = DescriptorBlock::new(&hex_literal::hex!(
            "
            5F 04 00000028
            83 04 0001 FC01
            83 0A
            "
        ));
        let out = display(|disp| disp.display_descriptor_list(&block));
        assert_eq!(
            out,
            concat!(
                "- Descriptor 0: private data specifier descriptor, Tag 95 (0x5F), 4 bytes\n",
                "  Specifier: 0x00000028 (EACEM)\n",
                "- Descriptor 1: logical channel number descriptor, Tag 131 (0x83), 4 bytes\n",
                "  Service Id: 1 (0x0001), Visible: 1, Channel number: 1\n",
                "- Descriptor 2: Tag 131 (0x83), 10 bytes, truncated to 0 bytes\n",
            ),
        );
    }
}

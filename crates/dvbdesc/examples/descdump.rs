use std::io::Read;
use std::path::PathBuf;

use dvbdesc::desc::names;
use dvbdesc::display::TablesDisplay;
use dvbdesc::xml::{self, Element};
use dvbdesc::{Context, DescriptorBlock};

#[derive(Debug)]
struct AppArgs {
    ctx: Context,
    xml: bool,
    list: bool,
    from_xml: Option<PathBuf>,
    hex: Vec<String>,
}

impl AppArgs {
    const HELP: &str = "\
記述子ループを表示・変換するコマンド

USAGE:
  descdump [OPTIONS] [HEX]...

FLAGS:
  -h, --help            このヘルプを表示する
  --xml                 表示の代わりにXMLで出力する
  --list                登録されている記述子の一覧を表示する

OPTIONS:
  --default-pds <PDS>   記述子ループの先頭で有効なプライベートデータ指定子（例：EACEM、0x28）
  --indent <N>          表示の字下げ幅
  --from-xml <PATH>     XMLファイルの記述子をバイナリ形式に変換して16進数で出力する

ARGS:
  <HEX>                 記述子ループの16進数文字列。省略時は標準入力から読み込む
";

    pub fn parse() -> Result<AppArgs, Box<dyn std::error::Error>> {
        let mut args = pico_args::Arguments::from_env();

        if args.contains(["-h", "--help"]) {
            println!("{}", Self::HELP);
            std::process::exit(0);
        }

        let xml = args.contains("--xml");
        let list = args.contains("--list");
        let default_pds = args
            .opt_value_from_fn("--default-pds", |s| {
                names::PRIVATE_DATA_SPECIFIER
                    .parse(s)
                    .ok_or_else(|| format!("invalid private data specifier: {}", s))
            })?
            .unwrap_or(0);
        let indent = args.opt_value_from_str("--indent")?.unwrap_or(0);
        let from_xml = args.opt_value_from_os_str("--from-xml", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?;
        let hex = args
            .finish()
            .into_iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();

        Ok(AppArgs {
            ctx: Context {
                default_pds,
                indent,
            },
            xml,
            list,
            from_xml,
            hex,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = AppArgs::parse()?;

    env_logger::init();

    let registry = dvbdesc::registry::init()?;

    if args.list {
        for factory in registry.iter() {
            println!("{:<24} {}", factory.edid().to_string(), factory.xml_name());
        }
        return Ok(());
    }

    if let Some(path) = &args.from_xml {
        let text = std::fs::read_to_string(path)?;
        let root = Element::parse(&text)?;
        // ルート要素が記述子でなければ子要素を記述子とみなす
        let elements: Vec<&Element> =
            if root.has_name("generic_descriptor") || registry.lookup_xml(root.name()).is_some() {
                vec![&root]
            } else {
                root.children().iter().collect()
            };

        for element in elements {
            let decoded = registry.from_xml(element)?;
            let buf = decoded.serialize()?;
            let hex: Vec<String> = buf.as_bytes().iter().map(|b| format!("{:02X}", b)).collect();
            println!("{}", hex.join(" "));
        }
        return Ok(());
    }

    let text = if args.hex.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        args.hex.join(" ")
    };
    let data = xml::parse_hex(&text).ok_or("invalid hexadecimal string")?;
    let block = DescriptorBlock::new(&data);

    if args.xml {
        let mut root = Element::new("descriptors");
        for decoded in registry.decode_block(&block, args.ctx.default_pds) {
            if let Err(e) = decoded.to_xml(&mut root) {
                log::warn!("descriptor {}: {}", decoded.edid(), e);
            }
        }
        println!("{}", root.to_xml_string()?);
    } else {
        let mut disp = TablesDisplay::new(registry, &args.ctx);
        disp.display_descriptor_list(&block);
        print!("{}", disp.output());
    }

    Ok(())
}

//! 記述子の判別や表示に使う設定。

use crate::desc::pds;

/// 記述子の判別や表示に使う設定。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Context {
    /// 記述子ループの先頭で有効なプライベートデータ指定子。無い場合は0。
    ///
    /// プライベートデータ指定記述子を送出しない事業者の記述子を読む際に指定する。
    pub default_pds: u32,

    /// 表示の字下げ幅。
    pub indent: usize,
}

impl Context {
    /// 既定の設定で`Context`を生成する。
    #[inline]
    pub fn new() -> Context {
        Context::default()
    }

    /// EACEMの記述子を既定とする`Context`を生成する。
    ///
    /// 欧州の地上波ではプライベートデータ指定記述子を省略して
    /// 論理チャンネル番号記述子を送出する事業者がある。
    pub fn eacem() -> Context {
        Context {
            default_pds: pds::EACEM,
            ..Context::default()
        }
    }
}

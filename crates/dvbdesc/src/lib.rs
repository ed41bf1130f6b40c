//! DVBの記述子を読み書きするためのクレート。
//!
//! 記述子はバイナリ形式とXML形式の相互変換、および人が読める形式での表示に対応する。
//! 型が分かっている記述子は[`desc::Descriptor`]を、
//! 記述子ループから読み取る場合は[`registry::Registry`]を使う。

#![deny(missing_docs)]

pub mod context;
pub mod cursor;
pub mod desc;
pub mod display;
pub mod enumeration;
pub mod registry;
pub mod types;
pub mod xml;
mod utils;

pub use context::Context;
pub use desc::{Descriptor, DescriptorBlock, DescriptorBuf, Edid};
pub use registry::{Decoded, Registry};

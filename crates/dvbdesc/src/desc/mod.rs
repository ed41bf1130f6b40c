//! 記述子と関連する型の定義。

mod base;
mod block;
mod cable;
mod cp_identifier;
mod edid;
mod lcn;
pub mod names;
mod satellite;
mod specifier;
mod subtitling;

pub use base::*;
pub use block::*;
pub use cable::*;
pub use cp_identifier::*;
pub use edid::*;
pub use lcn::*;
pub use satellite::*;
pub use specifier::*;
pub use subtitling::*;

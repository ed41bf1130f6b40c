//! 記述子で使われる、定数を伴う型。

/// 偏波。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polarization {
    /// 水平。
    #[default]
    LinearHorizontal,
    /// 垂直。
    LinearVertical,
    /// 左旋。
    CircularLeft,
    /// 右旋。
    CircularRight,
}

impl Polarization {
    /// 2ビットの値から`Polarization`を生成する。上位ビットは無視する。
    #[inline]
    pub fn from_bits(bits: u8) -> Polarization {
        match bits & 0b11 {
            0b00 => Polarization::LinearHorizontal,
            0b01 => Polarization::LinearVertical,
            0b10 => Polarization::CircularLeft,
            _ => Polarization::CircularRight,
        }
    }

    /// 2ビットの値を返す。
    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            Polarization::LinearHorizontal => 0b00,
            Polarization::LinearVertical => 0b01,
            Polarization::CircularLeft => 0b10,
            Polarization::CircularRight => 0b11,
        }
    }
}

/// 分配システムの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliverySystem {
    /// DVB-S。
    DvbS,
    /// DVB-S2。
    DvbS2,
    /// DVB-C。
    DvbC,
}

impl DeliverySystem {
    /// 表示用の名前を返す。
    pub fn name(self) -> &'static str {
        match self {
            DeliverySystem::DvbS => "DVB-S",
            DeliverySystem::DvbS2 => "DVB-S2",
            DeliverySystem::DvbC => "DVB-C",
        }
    }
}

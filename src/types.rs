//! Shared types and enums used across scenestack.
//! Includes the pixel `DataType` lattice, the wire `AxisOrder` flag,
//! warp `Resampler` algorithms, and per-band `Scale` entries.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Pixel data types understood by the rasterization service.
/// Names match the wire format (`"Byte"`, `"UInt16"`, ...).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    /// Width of one element in bytes, as serialized in array payloads.
    pub fn byte_width(self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, DataType::Int16 | DataType::Int32)
    }

    /// Integer bit width; floats report the width they represent exactly.
    fn bits(self) -> u32 {
        match self {
            DataType::Byte => 8,
            DataType::UInt16 | DataType::Int16 => 16,
            DataType::UInt32 | DataType::Int32 => 32,
            DataType::Float32 => 24,
            DataType::Float64 => 53,
        }
    }

    /// Smallest type in the lattice that can represent values of both inputs.
    ///
    /// Follows the usual array-library promotion rules: equal types are kept,
    /// floats absorb narrow integers, and a signed/unsigned mix widens to the
    /// next signed type able to hold both. `UInt32` mixed with a signed type
    /// has no 64-bit integer home here and lands on `Float64`, which holds
    /// every supported integer exactly.
    pub fn promote(self, other: DataType) -> DataType {
        use DataType::*;
        if self == other {
            return self;
        }
        if self == Float64 || other == Float64 {
            return Float64;
        }
        if self == Float32 || other == Float32 {
            let int = if self == Float32 { other } else { self };
            return if int.bits() <= 16 { Float32 } else { Float64 };
        }
        match (self.is_signed(), other.is_signed()) {
            (true, true) | (false, false) => {
                if self.bits() >= other.bits() { self } else { other }
            }
            _ => {
                let (signed, unsigned) = if self.is_signed() {
                    (self, other)
                } else {
                    (other, self)
                };
                if unsigned.bits() < signed.bits() {
                    signed
                } else if unsigned.bits() < 32 {
                    Int32
                } else {
                    Float64
                }
            }
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Byte => "Byte",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        };
        write!(f, "{}", s)
    }
}

// Manual implementation to keep CLI spellings aligned with the wire names
impl ValueEnum for DataType {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            DataType::Byte,
            DataType::UInt16,
            DataType::Int16,
            DataType::UInt32,
            DataType::Int32,
            DataType::Float32,
            DataType::Float64,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            DataType::Byte => clap::builder::PossibleValue::new("byte"),
            DataType::UInt16 => clap::builder::PossibleValue::new("uint16"),
            DataType::Int16 => clap::builder::PossibleValue::new("int16"),
            DataType::UInt32 => clap::builder::PossibleValue::new("uint32"),
            DataType::Int32 => clap::builder::PossibleValue::new("int32"),
            DataType::Float32 => clap::builder::PossibleValue::new("float32"),
            DataType::Float64 => clap::builder::PossibleValue::new("float64"),
        })
    }
}

/// Axis layout of a returned array: `Image` is (row, col, band),
/// `Gdal` is (band, row, col).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrder {
    Image,
    Gdal,
}

impl std::fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisOrder::Image => write!(f, "image"),
            AxisOrder::Gdal => write!(f, "gdal"),
        }
    }
}

/// Resampling algorithm applied by the server-side warp.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampler {
    Near,
    Bilinear,
    Cubic,
    #[serde(rename = "cubicspline")]
    #[value(name = "cubicspline")]
    CubicSpline,
    Lanczos,
    Average,
    Mode,
    Max,
    Min,
    Med,
    Q1,
    Q3,
}

/// Per-band scaling entry for the rasterization request.
/// `Source` scales a source range to the full output range;
/// `Full` maps (src_min, src_max) onto (dst_min, dst_max).
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scale {
    Source(f64, f64),
    Full(f64, f64, f64, f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_is_symmetric_and_idempotent() {
        use DataType::*;
        let all = [Byte, UInt16, Int16, UInt32, Int32, Float32, Float64];
        for a in all {
            assert_eq!(a.promote(a), a);
            for b in all {
                assert_eq!(a.promote(b), b.promote(a));
            }
        }
    }

    #[test]
    fn promote_integer_lattice() {
        use DataType::*;
        assert_eq!(Byte.promote(UInt16), UInt16);
        assert_eq!(Byte.promote(Int16), Int16);
        assert_eq!(UInt16.promote(Int16), Int32);
        assert_eq!(UInt16.promote(UInt32), UInt32);
        assert_eq!(UInt32.promote(Int32), Float64);
        assert_eq!(Int16.promote(Int32), Int32);
    }

    #[test]
    fn promote_floats_absorb() {
        use DataType::*;
        assert_eq!(Float32.promote(Byte), Float32);
        assert_eq!(Float32.promote(Int16), Float32);
        assert_eq!(Float32.promote(Int32), Float64);
        assert_eq!(Float32.promote(UInt32), Float64);
        assert_eq!(Float64.promote(Float32), Float64);
    }

    #[test]
    fn wire_names_round_trip() {
        let dt: DataType = serde_json::from_str("\"UInt16\"").unwrap();
        assert_eq!(dt, DataType::UInt16);
        assert_eq!(serde_json::to_string(&DataType::Byte).unwrap(), "\"Byte\"");

        let order: AxisOrder = serde_json::from_str("\"gdal\"").unwrap();
        assert_eq!(order, AxisOrder::Gdal);

        let resampler = serde_json::to_string(&Resampler::CubicSpline).unwrap();
        assert_eq!(resampler, "\"cubicspline\"");
    }

    #[test]
    fn scale_serializes_as_tuple() {
        let s = serde_json::to_string(&Scale::Source(0.0, 4000.0)).unwrap();
        assert_eq!(s, "[0.0,4000.0]");
        let s = serde_json::to_string(&Scale::Full(0.0, 1.0, 10.0, 100.0)).unwrap();
        assert_eq!(s, "[0.0,1.0,10.0,100.0]");
    }
}

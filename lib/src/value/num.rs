use std::fmt;

use serde::{Serialize, Deserialize};

/// A numeric value, as written in a document's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    /// A signed integer.
    I64(i64),
    /// An unsigned integer too large for `i64`.
    U64(u64),
    /// Anything with a fractional part or an exponent.
    F64(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::I64(v) => v as f64,
            Num::U64(v) => v as f64,
            Num::F64(v) => v,
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::I64(v) => fmt::Display::fmt(v, f),
            Num::U64(v) => fmt::Display::fmt(v, f),
            Num::F64(v) => fmt::Display::fmt(v, f),
        }
    }
}

macro_rules! impl_from_for_num {
    ($($T:ty: $V:ident),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value.into())
            }
        }
    )*)
}

impl_from_for_num! {
    i8: I64, i16: I64, i32: I64, i64: I64,
    u8: I64, u16: I64, u32: I64, u64: U64,
    f32: F64, f64: F64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_source_spelling() {
        assert_eq!(Num::from(2024i32).to_string(), "2024");
        assert_eq!(Num::from(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Num::from(3.5f64).to_string(), "3.5");
        assert_eq!(Num::from(-7i8).as_f64(), -7.0);
    }
}

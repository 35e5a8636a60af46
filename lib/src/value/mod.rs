mod value;
mod num;

pub use value::*;
pub use num::*;

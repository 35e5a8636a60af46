//! Reference rendering of page bodies to HTML.

mod blocks;
mod html;

pub use blocks::*;
pub use html::*;

mod editor;
mod error;
mod ops;
mod split;
mod tree;

pub use crate::editor::*;
pub use crate::error::*;
pub use crate::ops::*;
pub use crate::tree::*;

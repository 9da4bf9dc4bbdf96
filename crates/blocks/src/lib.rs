mod block;
mod commands;
mod config;
mod editor;
mod error;
mod history;
mod inverse;
mod ops;
mod plugin;
mod registry;
mod selection;
mod store;
mod transforms;
mod value;

pub use crate::block::*;
pub use crate::config::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::history::*;
pub use crate::inverse::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::registry::*;
pub use crate::selection::*;
pub use crate::store::*;
pub use crate::transforms::*;
pub use crate::value::*;

pub use manos_inline::{
    AttrPatch, InlineEditor, InlineError, InlineOp, InlineTree, Marks, Node, Point,
    RichTextEditor, Selection,
};

pub type Result<T> = std::result::Result<T, BlockError>;

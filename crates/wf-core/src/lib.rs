pub mod content;
pub mod error;
pub mod graph;
pub mod path;
pub mod rng;
pub mod sequence;
pub mod value;

pub use content::*;
pub use error::WeftError;
pub use graph::{ContainerNode, ContentGraph, GraphContent, NodeId};
pub use path::{Component, Path};
pub use sequence::{shuffle_index, SequenceKind, MAX_SHUFFLE_ELEMENTS};
pub use value::RuntimeValue;

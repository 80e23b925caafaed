pub mod node;

pub use node::{Node, RawRecord};

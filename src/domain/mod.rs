pub mod metadata;
pub mod node;
pub mod sample;

pub use metadata::*;
pub use node::*;
pub use sample::*;

pub mod display;
pub mod node;
pub mod value;

pub use display::*;
pub use node::*;
pub use value::*;

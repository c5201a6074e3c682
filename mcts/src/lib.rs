pub mod backprop;
pub mod node;
pub mod noise;
pub mod options;
pub mod results;
pub mod roots;
pub mod select;
pub mod traverse;
pub mod tree;

pub use backprop::*;
pub use node::*;
pub use noise::*;
pub use options::*;
pub use results::*;
pub use roots::*;
pub use select::*;
pub use traverse::*;
pub use tree::*;

#[cfg(test)]
mod stub_model;

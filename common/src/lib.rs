pub mod config;
pub mod math;
pub mod minmax;
pub mod softmax;

pub use config::*;
pub use math::*;
pub use minmax::*;
pub use softmax::*;

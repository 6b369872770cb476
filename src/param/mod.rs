mod base;
pub use base::{BaseParam, BoolParam, FloatParam, IntParam};

mod composite;
pub use composite::{QuadParam, Vector2, XYParam};

pub mod binary;
pub use binary::BinaryParam;

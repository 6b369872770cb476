#[macro_use] extern crate log;

pub mod core;
pub mod oracle;
pub mod param;

/** Android **/
#[cfg(target_os = "android")]
mod android;

#[cfg(target_os = "android")]
use android::log_impl;

/** Windows **/
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "windows")]
use windows::log_impl;

/** Everything else **/
#[cfg(not(any(target_os = "android", target_os = "windows")))]
mod generic;

#[cfg(not(any(target_os = "android", target_os = "windows")))]
use generic::log_impl;

pub use crate::core::{Config, Error, IndexCorrection, ParamLib, PriorityScheduler};
pub use oracle::{MemoryOracle, ParamDescriptor, ParamKind, ParameterOracle};
pub use param::{BaseParam, BinaryParam, BoolParam, FloatParam, IntParam, QuadParam, Vector2, XYParam};

pub mod param_lib;
pub use param_lib::{Config, IndexCorrection, ParamLib};

mod error;
pub use error::Error;

pub mod priority;
pub use priority::{DriverHandle, PriorityScheduler, PriorityTask, PRIORITY_CAPACITY, PRIORITY_INTERVAL};

pub mod utils;
pub mod log;

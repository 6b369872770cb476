pub mod log_impl;

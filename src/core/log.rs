use crate::log_impl;

/// Installs the platform logger. Debug mode also reports parameters that fail to resolve.
pub fn init(debug_mode: bool) {
    init_with_level(if debug_mode {
        log::LevelFilter::Debug
    }
    else {
        log::LevelFilter::Info
    });
}

pub fn init_with_level(filter_level: log::LevelFilter) {
    log_impl::init(filter_level);
    debug!("Logging initialized at {}", filter_level);
}

pub fn init(filter_level: log::LevelFilter) {
    let Some(level) = filter_level.to_level() else {
        log::set_max_level(log::LevelFilter::Off);
        return;
    };

    // The host may have installed its own logger already
    if windebug_logger::init_with_level(level).is_err() {
        log::set_max_level(filter_level);
    }
}

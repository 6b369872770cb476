pub fn init(filter_level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(filter_level)
        .parse_default_env()
        .try_init();

    // The host may have installed its own logger already
    if result.is_err() {
        log::set_max_level(filter_level);
    }
}

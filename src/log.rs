use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

pub fn init(level: LevelFilter) {
    TermLogger::init(
        level,
        ConfigBuilder::new()
            .add_filter_allow_str("geofactbot")
            .build(),
        TerminalMode::Stdout,
        ColorChoice::Auto,
    )
    .unwrap();
}

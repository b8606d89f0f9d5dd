use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::Errno;

pub const LOG_PATTERN: &str = "{d} {l} {t} - {m}{n}";

pub fn parse_level(level: &str) -> Result<LevelFilter, Errno> {
    level.trim().parse::<LevelFilter>()
        .map_err(|_| Errno::Einval(format!("invalid log level: {}, should be one of off|error|warn|info|debug|trace", level)))
}

// logs go to stderr unless a file is given, so stdout only carries command output.
pub fn build_log_config(level: &str, file: &str) -> Result<Config, Errno> {
    let level = parse_level(level)?;
    let encoder = Box::new(PatternEncoder::new(LOG_PATTERN));
    let appender = if file.is_empty() {
        let console = ConsoleAppender::builder()
            .encoder(encoder)
            .target(Target::Stderr)
            .build();
        Appender::builder().build("objcli", Box::new(console))
    } else {
        let file_appender = FileAppender::builder()
            .encoder(encoder)
            .build(file)?;
        Appender::builder().build("objcli", Box::new(file_appender))
    };

    Config::builder()
        .appender(appender)
        .build(Root::builder().appender("objcli").build(level))
        .map_err(|err| Errno::Econfig(format!("failed to build log config, err: {}", err)))
}

pub fn init_log(level: &str, file: &str) -> Result<(), Errno> {
    let config = build_log_config(level, file)?;
    match log4rs::init_config(config) {
        Ok(_) => Ok(()),
        Err(err) => Err(Errno::Econfig(format!("failed to config log, err: {}", err))),
    }
}

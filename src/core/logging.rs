use console::style;
use log::{Level, LevelFilter};

use crate::types::config::{colors_enabled, config};

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn level_tag(level: Level, color: bool) -> String {
    let tag = format!("[{level}]");
    if !color {
        return tag;
    }
    match level {
        Level::Error => style(tag).red().bold().to_string(),
        Level::Warn => style(tag).yellow().to_string(),
        Level::Debug | Level::Trace => style(tag).dim().to_string(),
        Level::Info => tag,
    }
}

/// Install the global logger. Info lines are printed bare since reports are
/// emitted through `info!`; every other level is tagged.
pub fn init_logging() {
    let level = parse_level(config().log().level());
    let color = colors_enabled();
    console::set_colors_enabled(color);

    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            if record.level() == Level::Info {
                out.finish(format_args!("{message}"))
            } else {
                out.finish(format_args!(
                    "{} {}",
                    level_tag(record.level(), color),
                    message
                ))
            }
        })
        .level(level)
        // sqlx logs every statement at info
        .level_for("sqlx", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply();

    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }

    #[test]
    fn plain_tags_without_color() {
        assert_eq!(level_tag(Level::Warn, false), "[WARN]");
        assert_eq!(level_tag(Level::Error, false), "[ERROR]");
    }
}

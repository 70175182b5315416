use crate::{args::Args, MainError};
use log::{Level, LevelFilter};
use simplelog::{
    format_description, Color, ColorChoice, ConfigBuilder, LevelPadding, TermLogger, TerminalMode,
    ThreadLogMode,
};

const TIMESTAMP_FORMAT_OFFSET: &[simplelog::FormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

fn level_filter(quiet: bool, verbose: u8) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

fn conflicting_flags(quiet: bool, verbose: u8) -> Option<&'static str> {
    (quiet && verbose > 0)
        .then_some("Both --quiet and --verbose are set, only errors will be printed.")
}

/// Log to the terminal. With tracing, the thread names (gsave-debounce, gsave-job)
/// are printed too, to follow a save across the threads.
pub fn init_logger(args: &Args) -> Result<(), MainError> {
    // Printed before the logger, the error level would hide it.
    if let Some(warning) = conflicting_flags(args.quiet, args.verbose) {
        eprintln!("{warning}");
    }

    TermLogger::init(
        level_filter(args.quiet, args.verbose),
        ConfigBuilder::new()
            .set_level_color(Level::Debug, Some(Color::Magenta))
            .set_level_color(Level::Trace, None)
            .set_level_padding(LevelPadding::Right)
            .set_target_level(LevelFilter::Off)
            .set_thread_level(LevelFilter::Trace)
            .set_thread_mode(ThreadLogMode::Names)
            .set_time_format_custom(TIMESTAMP_FORMAT_OFFSET)
            .set_time_offset_to_local()
            .map_err(|_| MainError::FailedLoggerTimezones)?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_map_the_verbosity() {
        assert_eq!(LevelFilter::Info, level_filter(false, 0));
        assert_eq!(LevelFilter::Debug, level_filter(false, 1));
        assert_eq!(LevelFilter::Trace, level_filter(false, 2));
        assert_eq!(LevelFilter::Trace, level_filter(false, 5));
        assert_eq!(LevelFilter::Error, level_filter(true, 2));
    }

    #[test]
    fn it_should_warn_about_quiet_and_verbose_together() {
        assert!(conflicting_flags(true, 1).is_some());
        assert_eq!(None, conflicting_flags(true, 0));
        assert_eq!(None, conflicting_flags(false, 2));
    }
}

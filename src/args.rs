use duration_string::DurationString;
use gumdrop::Options;

/// Commit and push files every time they are saved.
#[derive(Debug, Options)]
pub struct Args {
    /// Read the paths of the saved files from the standard input, one per line.
    ///
    /// The program stops when the input is closed.
    #[options(no_short)]
    pub stdin: bool,

    /// Runs an HTTP server on the address, which accepts saved files on POST /save.
    #[options(no_short)]
    pub http: Option<String>,

    /// Wait this long after the last save before committing.
    ///
    /// Can be a number postfixed with ms, s(econd), m(inutes), h(ours).
    #[options(default = "1s")]
    pub debounce: DurationString,

    /// Kill git commands that run longer than this, 0s disables it.
    #[options(default = "1m")]
    pub timeout: DurationString,

    /// The git binary to run.
    #[options(no_short, default = "git")]
    pub git: String,

    /// Push even if there was nothing to commit (to publish earlier commits).
    #[options(no_short)]
    pub push_after_noop: bool,

    /// Start with saving disabled, it can be enabled with POST /enable.
    #[options(no_short)]
    pub disabled: bool,

    /// Increase verbosity, can be set multiple times (-v debug, -vv tracing)
    #[options(count)]
    pub verbose: u8,

    /// Only print errors.
    #[options()]
    pub quiet: bool,

    /// Print the current version.
    #[options(short = "V")]
    pub version: bool,

    /// Print this help.
    #[options()]
    pub help: bool,
}

pub fn parse_args() -> Args {
    Args::parse_args_default_or_exit()
}

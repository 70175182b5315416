use args::{parse_args, Args};
use gsave_bin::{
    autosave::{AutosaveConfig, Autosaver},
    debounce::DebounceError,
    notify::LogNotifier,
    runner::{git::GitRunner, CommandRunner},
    start::{start, StartError},
    triggers::{http::HttpTrigger, signal::SignalTrigger, stdin::StdinTrigger, Trigger},
};
use log::SetLoggerError;
use logger::init_logger;
use std::{process, sync::Arc, time::Duration};
use thiserror::Error;

mod args;
mod logger;

#[derive(Debug, Error)]
pub enum MainError {
    #[error("Failed setting up the timezone of the logger.")]
    FailedLoggerTimezones,
    #[error("Failed setting up the logger: {0}.")]
    FailedLogger(#[from] SetLoggerError),
    #[error("You have to pass --stdin or --http to receive the saved files.")]
    NoTriggers,
    #[error("{0}")]
    FailedDebounce(#[from] DebounceError),
    #[error("{0}")]
    FailedStart(#[from] StartError),
}

fn main_inner(args: Args) -> Result<(), MainError> {
    init_logger(&args)?;

    // Setup triggers.
    let mut triggers: Vec<Box<dyn Trigger>> = vec![];
    if args.stdin {
        triggers.push(Box::new(StdinTrigger));
    }
    if let Some(http) = args.http {
        triggers.push(Box::new(HttpTrigger::new(http)));
    }
    if triggers.is_empty() {
        return Err(MainError::NoTriggers);
    }
    triggers.push(Box::new(SignalTrigger::new()));

    // Setup the runner.
    let timeout: Duration = args.timeout.into();
    let runner: Arc<dyn CommandRunner> = if timeout.is_zero() {
        Arc::new(GitRunner::new(args.git))
    } else {
        Arc::new(GitRunner::new_with_timeout(args.git, timeout))
    };

    // Setup the autosaver.
    let config = AutosaveConfig {
        debounce: args.debounce.into(),
        push_after_noop_commit: args.push_after_noop,
        enabled: !args.disabled,
    };
    let autosaver = Autosaver::new(config, runner, Arc::new(LogNotifier))?;

    start(triggers, autosaver)?;

    Ok(())
}

fn main() {
    let args = parse_args();
    if args.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(err) = main_inner(args) {
        eprintln!("{err}");
        process::exit(1);
    }
}

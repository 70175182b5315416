use std::{env, path::Path};
use time::{macros::format_description, OffsetDateTime};

/// The format of the admission timestamp, this is also the commit message.
const TIMESTAMP_FORMAT: &[time::format_description::FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The context of a save, before it is admitted into the queue.
///
/// This is what the triggers send and what the debounce window carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveTrigger {
    pub path: String,
    pub display_name: String,
    pub working_directory: String,
}

impl SaveTrigger {
    pub fn new(path: String, display_name: String, working_directory: String) -> Self {
        SaveTrigger {
            path,
            display_name,
            working_directory,
        }
    }

    /// Derive the display name (the file name) and the working directory (the parent
    /// directory) from a file path. Relative paths are resolved against the current
    /// directory. Returns None for paths without a file name.
    pub fn from_path(path: &str) -> Option<Self> {
        let display_name = Path::new(path).file_name()?.to_string_lossy().to_string();

        let file = if Path::new(path).is_absolute() {
            Path::new(path).to_path_buf()
        } else {
            env::current_dir().ok()?.join(path)
        };
        let working_directory = file.parent()?.to_string_lossy().to_string();

        Some(SaveTrigger::new(
            file.to_string_lossy().to_string(),
            display_name,
            working_directory,
        ))
    }
}

/// A save that was admitted into the queue.
///
/// The timestamp is set at admission (after the debounce fired), never at the time
/// of the original trigger. It is used as the commit message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    pub path: String,
    pub display_name: String,
    pub working_directory: String,
    pub timestamp: String,
}

impl SaveRequest {
    /// Admit a trigger with the current local time.
    pub fn admit(trigger: SaveTrigger) -> Self {
        SaveRequest::with_timestamp(trigger, current_timestamp())
    }

    pub fn with_timestamp(trigger: SaveTrigger, timestamp: String) -> Self {
        let SaveTrigger {
            path,
            display_name,
            working_directory,
        } = trigger;

        SaveRequest {
            path,
            display_name,
            working_directory,
            timestamp,
        }
    }
}

fn current_timestamp() -> String {
    // The local offset can be unknown (e.g. multithreaded on some platforms), fall back to UTC.
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| now.to_string())
}

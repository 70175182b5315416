use crate::request::SaveRequest;
use log::{debug, error};
use mockall::automock;


/// A notifier receives the terminal outcome of every admitted save.
///
/// Success is expected to be quiet, only the failures should be user-visible.
#[automock]
pub trait Notifier: Send + Sync {
    /// The save was committed and pushed (or there was nothing to do).
    fn on_success(&self, request: &SaveRequest);
    /// The save failed, the message contains the output of the failing command.
    fn on_error(&self, request: &SaveRequest, message: &str);
}

/// A notifier that writes the outcomes to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_success(&self, request: &SaveRequest) {
        debug!("Saved {} at {}.", request.display_name, request.timestamp);
    }

    fn on_error(&self, request: &SaveRequest, message: &str) {
        error!("Failed saving {}: {message}.", request.display_name);
    }
}

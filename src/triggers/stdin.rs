use super::{Event, Trigger, TriggerError};
use crate::request::SaveTrigger;
use log::{debug, warn};
use std::{
    io::{self, BufRead},
    sync::mpsc::Sender,
};

/// A trigger that reads the paths of saved files from the standard input.
///
/// Every non-empty line is a saved file. This can be used from an editor hook
/// (e.g. piping the file name on every write). When the input is closed,
/// the program stops after the pending saves finished.
pub struct StdinTrigger;

impl StdinTrigger {
    fn listen_inner<R>(&self, tx: Sender<Option<Event>>, reader: R) -> Result<(), TriggerError>
    where
        R: BufRead,
    {
        for line in reader.lines() {
            let line = line.map_err(|err| TriggerError::FailedTrigger(err.to_string()))?;
            let path = line.trim();
            if path.is_empty() {
                continue;
            }

            match SaveTrigger::from_path(path) {
                Some(trigger) => tx.send(Some(Event::Save(trigger)))?,
                None => warn!("Cannot save {path:?}, it is not a file."),
            }
        }

        debug!("Standard input closed.");
        tx.send(None)?;

        Ok(())
    }
}

impl Trigger for StdinTrigger {
    /// Reads the standard input line by line until it is closed.
    fn listen(&self, tx: Sender<Option<Event>>) -> Result<(), TriggerError> {
        self.listen_inner(tx, io::stdin().lock())
    }
}

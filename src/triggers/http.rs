use super::{Event, Trigger, TriggerError};
use crate::request::SaveTrigger;
use log::{debug, info, warn};
use std::{
    io::Read,
    sync::mpsc::{self, Sender},
    time::Duration,
};
use tiny_http::{Method, Response, Server};

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// A trigger that accepts saves and commands on HTTP requests.
///
/// This can be called from editor plugins or scripts that cannot write to our stdin.
///
/// Routes:
///   - `POST /save`: the body is the path of the saved file
///   - `POST /enable`, `POST /disable`: toggle accepting saves
///   - `GET /status`: the current status in plaintext
pub struct HttpTrigger {
    http: String,
}

impl HttpTrigger {
    /// Create an new HTTP trigger with a HTTP url. It accepts an address as a string,
    /// for example "1234" or "127.0.0.1:1234".
    pub fn new(http: String) -> Self {
        Self { http }
    }

    fn route(
        method: &Method,
        url: &str,
        body: &str,
        tx: &Sender<Option<Event>>,
    ) -> Result<(u16, String), TriggerError> {
        let path = url.split('?').next().unwrap_or(url);
        match (method, path) {
            (Method::Post, "/save") => match SaveTrigger::from_path(body.trim()) {
                Some(trigger) => {
                    tx.send(Some(Event::Save(trigger)))?;
                    Ok((200, String::from("OK")))
                }
                None => Ok((400, format!("Cannot save {:?}, it is not a file.", body.trim()))),
            },
            (Method::Post, "/enable") => {
                tx.send(Some(Event::Enable))?;
                Ok((200, String::from("OK")))
            }
            (Method::Post, "/disable") => {
                tx.send(Some(Event::Disable))?;
                Ok((200, String::from("OK")))
            }
            (Method::Get, "/status") => {
                let (status_tx, status_rx) = mpsc::channel();
                tx.send(Some(Event::Status(status_tx)))?;
                match status_rx.recv_timeout(STATUS_TIMEOUT) {
                    Ok(status) => Ok((200, status.to_string())),
                    Err(_) => Ok((503, String::from("Status is not available."))),
                }
            }
            _ => Ok((404, String::from("Not Found"))),
        }
    }
}

impl Trigger for HttpTrigger {
    /// Starts a minimal HTTP 1.1 server, that routes the requests to events.
    fn listen(&self, tx: Sender<Option<Event>>) -> Result<(), TriggerError> {
        let listener = Server::http(&self.http).map_err(|_| {
            TriggerError::Misconfigured(format!("cannot start server on {}", self.http))
        })?;
        info!("Listening on {}...", self.http);

        for mut request in listener.incoming_requests() {
            debug!("Received request on {} {}", request.method(), request.url());

            let mut body = String::new();
            if let Err(err) = request.as_reader().read_to_string(&mut body) {
                warn!("Cannot read the request body: {err}.");
            }

            let (status, message) = Self::route(request.method(), request.url(), &body, &tx)?;

            if let Err(err) = request.respond(Response::from_string(message).with_status_code(status))
            {
                warn!("Cannot respond to the request: {err}.");
            }
        }

        Ok(())
    }
}

use rocket::response::{Responder, Response};
use rocket::{Request, http::Status};
use std::fmt;
use std::io::Cursor;

#[derive(Debug)]
pub enum ReportError {
    Config(String),
    Io(String),
    Parse(String),
    Scan(String),
    Git(String),
    Network(String),
    Upstream(String),
    Render(String),
    Timeout(String),
}

impl ReportError {
    fn status(&self) -> Status {
        match self {
            ReportError::Config(_) | ReportError::Parse(_) => Status::BadRequest,
            ReportError::Network(_) | ReportError::Upstream(_) => Status::BadGateway,
            ReportError::Timeout(_) => Status::GatewayTimeout,
            ReportError::Io(_)
            | ReportError::Scan(_)
            | ReportError::Git(_)
            | ReportError::Render(_) => Status::InternalServerError,
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ReportError::Io(msg) => write!(f, "I/O error: {msg}"),
            ReportError::Parse(msg) => write!(f, "Parse error: {msg}"),
            ReportError::Scan(msg) => write!(f, "Scan error: {msg}"),
            ReportError::Git(msg) => write!(f, "Git error: {msg}"),
            ReportError::Network(msg) => write!(f, "Network error: {msg}"),
            ReportError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            ReportError::Render(msg) => write!(f, "Render error: {msg}"),
            ReportError::Timeout(msg) => write!(f, "Timeout: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl<'r> Responder<'r, 'static> for ReportError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();
        let message = self.to_string();

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::Plain)
            .sized_body(message.len(), Cursor::new(message))
            .ok()
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::Network(err.to_string())
    }
}

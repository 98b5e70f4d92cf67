use chrono::{DateTime, FixedOffset};

use crate::{
    invariants::{RequestPath, ResponseSize, SourceAddr, StatusCode},
    parser::Grammar,
};

// Timestamp format for access logs: [10/Oct/2000:13:55:36 -0700]
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub source: SourceAddr,
    /// Authenticated user; `-` in the log means none.
    pub user: Option<String>,
    /// Bracketed timestamp text, without the brackets.
    pub timestamp: String,
    pub method: String,
    pub path: RequestPath,
    pub protocol: String,
    pub status: Option<StatusCode>,
    pub size: Option<ResponseSize>,
}

impl Request {
    /// Parsed form of [`Request::timestamp`], if it is well formed.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub referrer: Option<String>,
    pub user_agent: String,
}

/// One successfully parsed line, tagged with the grammar that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Common(Request),
    Combined { request: Request, client: Client },
    Nginx { request: Request, client: Client },
}

impl LogRecord {
    pub fn request(&self) -> &Request {
        match self {
            Self::Common(request)
            | Self::Combined { request, .. }
            | Self::Nginx { request, .. } => request,
        }
    }

    pub fn client(&self) -> Option<&Client> {
        match self {
            Self::Common(_) => None,
            Self::Combined { client, .. } | Self::Nginx { client, .. } => Some(client),
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Self::Common(_) => Grammar::Common,
            Self::Combined { .. } => Grammar::Combined,
            Self::Nginx { .. } => Grammar::Nginx,
        }
    }
}

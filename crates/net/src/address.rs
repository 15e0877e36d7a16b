//! Peer address parsing
//!
//! Accepted forms: `host`, `host:port`, `[v6]:port`, `quiz://host:port`.
//! The default port applies when none is given.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::DEFAULT_PORT;

const SCHEME: &str = "quiz://";

/// Where a guest connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddress {
    pub host: String,
    pub port: u16,
}

impl PeerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Format as URL string
    pub fn to_url(&self) -> String {
        format!("{}{}", SCHEME, self)
    }

    /// Parse from user input
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix(SCHEME).unwrap_or(s);
        let s = s.trim_end_matches('/');

        if s.is_empty() {
            return Err(Error::Protocol("Invalid address: empty host".into()));
        }

        // Bracketed IPv6, optionally with a port
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                Error::Protocol(format!("Invalid address: unclosed '[' in '{}'", s))
            })?;
            let port = match tail {
                "" => DEFAULT_PORT,
                t => parse_port(t.strip_prefix(':').unwrap_or(t))?,
            };
            return Ok(Self::new(host, port));
        }

        // A bare IPv6 literal has several colons and no port
        match s.matches(':').count() {
            0 => Ok(Self::new(s, DEFAULT_PORT)),
            1 => {
                let (host, port) = s.split_once(':').unwrap_or((s, ""));
                if host.is_empty() {
                    return Err(Error::Protocol("Invalid address: empty host".into()));
                }
                Ok(Self::new(host, parse_port(port)?))
            }
            _ => Ok(Self::new(s, DEFAULT_PORT)),
        }
    }
}

fn parse_port(s: &str) -> Result<u16> {
    s.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| Error::Protocol(format!("Invalid address: bad port '{}'", s)))
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for PeerAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

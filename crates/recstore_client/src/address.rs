//! Server address parsing.
//!
//! Accepted forms are `host`, `host:port`, `recstore://host` and
//! `recstore://host:port`. IPv6 hosts are written in brackets
//! (`[::1]:7017`). The port defaults to [`DEFAULT_PORT`].

use crate::error::{ClientError, ClientResult};
use recstore_protocol::DEFAULT_PORT;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

const SCHEME: &str = "recstore://";

/// A parsed server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Creates an address from parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal, without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the address, in the order the resolver returns them.
    pub fn resolve(&self) -> ClientResult<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ClientError::connection(format!("cannot resolve {}: {}", self, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(ClientError::connection(format!(
                "{} resolved to no addresses",
                self
            )));
        }
        Ok(addrs)
    }
}

impl FromStr for ServerAddress {
    type Err = ClientError;

    fn from_str(input: &str) -> ClientResult<Self> {
        let invalid = |reason| ClientError::invalid_address(input, reason);

        let rest = match input.find("://") {
            Some(_) => input
                .strip_prefix(SCHEME)
                .ok_or_else(|| invalid("unsupported scheme"))?,
            None => input,
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(invalid("missing host"));
        }
        if rest.contains('/') {
            return Err(invalid("unexpected path"));
        }

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unclosed '['"))?;
            let port = match after {
                "" => None,
                _ => Some(
                    after
                        .strip_prefix(':')
                        .ok_or_else(|| invalid("unexpected text after ']'"))?,
                ),
            };
            (host, port)
        } else {
            match rest.split_once(':') {
                Some((_, port)) if port.contains(':') => {
                    return Err(invalid("IPv6 hosts must be bracketed"))
                }
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = match port {
            None => DEFAULT_PORT,
            Some(p) => p.parse().map_err(|_| invalid("port is not a number"))?,
        };

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ServerAddress {
        s.parse().unwrap()
    }

    #[test]
    fn accepted_forms() {
        assert_eq!(parse("localhost"), ServerAddress::new("localhost", 7017));
        assert_eq!(parse("localhost:9000"), ServerAddress::new("localhost", 9000));
        assert_eq!(parse("recstore://db.local"), ServerAddress::new("db.local", 7017));
        assert_eq!(
            parse("recstore://db.local:27017/"),
            ServerAddress::new("db.local", 27017)
        );
        assert_eq!(parse("[::1]"), ServerAddress::new("::1", 7017));
        assert_eq!(parse("recstore://[::1]:8000"), ServerAddress::new("::1", 8000));
    }

    #[test]
    fn rejected_forms() {
        for bad in [
            "",
            "recstore://",
            "http://localhost",
            "localhost:",
            "localhost:port",
            "localhost:99999",
            ":7017",
            "::1",
            "[::1",
            "[::1]x",
            "host/db",
        ] {
            let err = bad.parse::<ServerAddress>().unwrap_err();
            assert!(
                matches!(err, ClientError::InvalidAddress { .. }),
                "{:?} gave {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for s in ["localhost:7017", "[::1]:8000", "10.0.0.1:1"] {
            assert_eq!(parse(s).to_string(), s);
        }
    }

    #[test]
    fn resolves_ip_literals() {
        let addrs = parse("127.0.0.1:7017").resolve().unwrap();
        assert_eq!(addrs, vec![SocketAddr::from(([127, 0, 0, 1], 7017))]);
    }
}

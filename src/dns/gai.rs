//! System DNS resolver using getaddrinfo.
//!
//! This resolver uses the operating system's native DNS resolution via
//! `getaddrinfo`, executed on the runtime's blocking pool so it never stalls
//! a worker that is driving the event loop.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::{context::IoResultExt, neterror::NetError};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// System DNS resolver using `getaddrinfo` in a thread pool.
///
/// IP literals are answered immediately without touching the system
/// resolver. Everything else goes through `tokio::task::spawn_blocking`.
///
/// Dropping the returned future does not interrupt `getaddrinfo` itself;
/// the blocking thread finishes in the background and its answer is
/// discarded.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            if let Some(addrs) = SocketAddrs::try_parse(name.as_str(), 0) {
                tracing::debug!(host = %name, "host is an IP literal, skipping lookup");
                return Ok(Box::new(addrs) as Addrs);
            }

            let host = name.as_str().to_string();
            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>())
            })
            .await;

            let addrs = result
                .map_err(|e| {
                    tracing::error!(error = %e, "DNS resolution task failed");
                    NetError::NameResolutionFailed
                })?
                .dns_context(name.as_str())?;

            tracing::debug!(host = %name, count = addrs.len(), "getaddrinfo complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Utility for parsing IP address strings directly.
///
/// Bypasses DNS resolution if the host is already an IP address.
#[derive(Debug)]
pub struct SocketAddrs {
    addrs: std::vec::IntoIter<SocketAddr>,
}

impl SocketAddrs {
    /// Creates a new `SocketAddrs` from a vector.
    pub fn new(addrs: Vec<SocketAddr>) -> Self {
        Self {
            addrs: addrs.into_iter(),
        }
    }

    /// Attempts to parse a host string as an IP address.
    ///
    /// Returns `Some` if the host is a valid IPv4 or IPv6 address (brackets
    /// around IPv6 are tolerated), `None` if it's a hostname that requires
    /// DNS resolution.
    pub fn try_parse(host: &str, port: u16) -> Option<Self> {
        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        bare.parse::<IpAddr>()
            .ok()
            .map(|ip| Self::new(vec![SocketAddr::new(ip, port)]))
    }

    /// Returns true if no addresses are left.
    pub fn is_empty(&self) -> bool {
        self.addrs.len() == 0
    }

    /// Returns the number of addresses left.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }
}

impl Iterator for SocketAddrs {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<Self::Item> {
        self.addrs.next()
    }
}

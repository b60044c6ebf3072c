//! The resolver seam the race is generic over, and the checks a hostname
//! and port go through before anything is scheduled.

use crate::base::neterror::NetError;
use std::{
    borrow::Cow, collections::HashMap, fmt, future::Future, net::SocketAddr, pin::Pin, sync::Arc,
};

/// Longest hostname accepted, in bytes (RFC 1035 presentation form).
pub const MAX_HOSTNAME_LEN: usize = 253;

/// Hostname handed to a resolver.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Wraps `host` as is. Use [`Name::parse`] for untrusted input.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// Rejects empty names, names longer than [`MAX_HOSTNAME_LEN`], and names
    /// containing whitespace or control characters (NUL included).
    pub fn parse(host: &str) -> Result<Self, NetError> {
        if host.is_empty() || host.len() > MAX_HOSTNAME_LEN {
            return Err(NetError::AddressInvalid);
        }
        if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(NetError::AddressInvalid);
        }
        Ok(Self::new(host))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Maps a port or service string to a port number.
///
/// Accepts decimal port numbers and the `http`/`https` service names.
pub fn service_port(service: &str) -> Result<u16, NetError> {
    match service {
        "http" => Ok(80),
        "https" => Ok(443),
        _ => service.parse::<u16>().map_err(|_| NetError::InvalidArgument),
    }
}

/// Addresses produced by a lookup, port 0.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// A lookup in flight. Dropping it abandons the lookup.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, NetError>> + Send>>;

/// Something that can look a hostname up.
///
/// The future may be polled from any worker, and may be dropped unfinished
/// when the deadline wins. An empty answer is not an error here; the race
/// decides what it means.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Answers pinned names from a fixed table without a lookup, and hands
/// everything else to `inner`.
///
/// Pinned answers are ready immediately, so a race over a pinned name is
/// decided on the first poll.
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: Arc<HashMap<Cow<'static, str>, Vec<SocketAddr>>>,
}

impl DnsResolverWithOverrides {
    pub fn new(
        inner: Arc<dyn Resolve>,
        overrides: HashMap<Cow<'static, str>, Vec<SocketAddr>>,
    ) -> Self {
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    /// Number of pinned names.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(addrs) = self.overrides.get(name.as_str()) {
            tracing::debug!(host = %name, count = addrs.len(), "answered from overrides");
            let addrs: Addrs = Box::new(addrs.clone().into_iter());
            return Box::pin(std::future::ready(Ok(addrs)));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

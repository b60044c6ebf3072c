//! Async DNS resolver using hickory-dns.
//!
//! Unlike `GaiResolver`, the lookup is a future on the event loop rather
//! than a blocking call, so a race that times out leaves no thread behind.

use super::{gai::SocketAddrs, Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{net::SocketAddr, sync::Arc};

/// Async DNS resolver backed by hickory-dns.
///
/// Each instance owns its resolver. The resolver spawns its connection
/// tasks on whichever runtime first polls a lookup, so create one per
/// event loop rather than sharing it across runtimes.
///
/// # Example
///
/// ```rust,ignore
/// use timedresolve::dns::{HickoryResolver, Name, Resolve};
///
/// let resolver = HickoryResolver::new();
/// let addrs = resolver.resolve(Name::new("example.com")).await?;
/// ```
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioResolver>,
}

impl HickoryResolver {
    /// Creates a new `HickoryResolver` from the system DNS configuration,
    /// falling back to hickory's defaults when it can't be read.
    pub fn new() -> Self {
        let mut builder = match TokioResolver::builder_tokio() {
            Ok(builder) => {
                tracing::debug!("Using system DNS configuration");
                builder
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to read system DNS config, using defaults"
                );
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
            }
        };

        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

        Self {
            resolver: Arc::new(builder.build()),
        }
    }

    /// Creates a resolver with explicit name servers and options, ignoring
    /// the system configuration.
    pub fn with_config(config: ResolverConfig, options: ResolverOpts) -> Self {
        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(options)
                .build();
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryResolver").finish_non_exhaustive()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        Box::pin(async move {
            if let Some(addrs) = SocketAddrs::try_parse(name.as_str(), 0) {
                return Ok(Box::new(addrs) as Addrs);
            }

            let domain = name.as_str();
            tracing::debug!(host = %domain, "resolving via hickory-dns");

            let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
                tracing::debug!(host = %domain, error = %e, "hickory-dns lookup failed");
                NetError::dns_failed(
                    domain,
                    std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
                )
            })?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();

            tracing::debug!(host = %domain, count = addrs.len(), "hickory-dns resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution with support for:
//! - System resolver (getaddrinfo via the blocking pool)
//! - Async hickory-dns resolver
//! - Hostname-to-IP override mechanism
//!
//! The `Resolve` trait is the seam the race coordinator is generic over, so
//! tests can substitute resolvers that stall, fail or return nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use timedresolve::dns::{GaiResolver, Name, Resolve};
//!
//! let resolver = GaiResolver::new();
//! for addr in resolver.resolve(Name::new("example.com")).await? {
//!     println!("Resolved: {}", addr);
//! }
//! ```

mod gai;
mod hickory;
mod resolve;

pub use gai::{GaiResolver, SocketAddrs};
pub use hickory::HickoryResolver;
pub use resolve::{
    service_port, Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving, MAX_HOSTNAME_LEN,
};

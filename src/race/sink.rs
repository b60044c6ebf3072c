//! Destinations for the addresses a race resolves.

use std::{
    io::{self, Write},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

/// Receives each address of the winning lookup, in resolver order.
///
/// Called from whichever worker thread delivered the completion.
pub trait AddressSink: Send + Sync {
    fn emit(&self, addr: SocketAddr);
}

impl<S: AddressSink + ?Sized> AddressSink for Arc<S> {
    fn emit(&self, addr: SocketAddr) {
        (**self).emit(addr)
    }
}

/// Writes `host:<ip>` lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    /// The line written for `addr`, without the newline.
    pub fn format(addr: &SocketAddr) -> String {
        format!("host:{}", addr.ip())
    }
}

impl AddressSink for StdoutSink {
    fn emit(&self, addr: SocketAddr) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", Self::format(&addr)) {
            tracing::warn!(error = %e, %addr, "failed to write address");
        }
    }
}

/// Keeps emitted addresses in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    addrs: Mutex<Vec<SocketAddr>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far.
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.addrs
            .lock()
            .map(|addrs| addrs.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl AddressSink for MemorySink {
    fn emit(&self, addr: SocketAddr) {
        match self.addrs.lock() {
            Ok(mut addrs) => addrs.push(addr),
            Err(poisoned) => poisoned.into_inner().push(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_line_format() {
        let v4: SocketAddr = "127.0.0.1:80".parse().unwrap();
        let v6: SocketAddr = "[::1]:80".parse().unwrap();
        assert_eq!(StdoutSink::format(&v4), "host:127.0.0.1");
        assert_eq!(StdoutSink::format(&v6), "host:::1");
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = Arc::new(MemorySink::new());
        let a: SocketAddr = "10.0.0.1:80".parse().unwrap();
        let b: SocketAddr = "10.0.0.2:80".parse().unwrap();

        sink.emit(a);
        AddressSink::emit(&sink, b);
        assert_eq!(sink.addrs(), vec![a, b]);
    }
}

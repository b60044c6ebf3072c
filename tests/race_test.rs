//! End-to-end race tests
//!
//! Covers:
//! - lookups that win, lose, fail or come back empty
//! - outcome independence from the worker count
//! - teardown while a race is still in flight
//! - the hickory-dns backend, offline

use timedresolve::base::neterror::NetError;
use hickory_resolver::config::{
    NameServerConfig, ResolveHosts, ResolverConfig, ResolverOpts,
};
use hickory_resolver::proto::xfer::Protocol;
use timedresolve::dns::{
    Addrs, DnsResolverWithOverrides, GaiResolver, HickoryResolver, Name, Resolve, Resolving,
};
use timedresolve::race::{MemorySink, RaceOutcome, RaceState};
use timedresolve::runner::{PoolRunner, RunnerConfig};

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SHORT_DEADLINE: Duration = Duration::from_millis(200);

/// Never answers. Records whether its lookup future was dropped unfinished.
#[derive(Default)]
struct StalledResolver {
    abandoned: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Resolve for StalledResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let flag = DropFlag(self.abandoned.clone());
        Box::pin(async move {
            let _flag = flag;
            std::future::pending::<()>().await;
            unreachable!()
        })
    }
}

struct FixedResolver {
    response: Result<Vec<SocketAddr>, NetError>,
}

impl Resolve for FixedResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let response = self.response.clone();
        Box::pin(async move { response.map(|addrs| Box::new(addrs.into_iter()) as Addrs) })
    }
}

fn config(threads: usize) -> RunnerConfig {
    RunnerConfig::new()
        .threads(threads)
        .deadline(SHORT_DEADLINE)
        .shutdown_grace(Duration::from_millis(100))
}

fn race<R: Resolve + 'static>(
    threads: usize,
    resolver: R,
    host: &str,
) -> (RaceOutcome, Vec<SocketAddr>, Duration) {
    let sink = Arc::new(MemorySink::new());
    let start = Instant::now();

    let runner = PoolRunner::with_resolver(config(threads), resolver, sink.clone()).unwrap();
    assert!(runner.start(host, "80"));
    let command = runner.command().clone();
    assert_eq!(runner.join(), threads);

    (command.outcome(), sink.addrs(), start.elapsed())
}

#[test]
fn test_localhost_resolves_well_before_deadline() {
    let sink = Arc::new(MemorySink::new());
    let start = Instant::now();

    let runner = PoolRunner::with_resolver(
        RunnerConfig::new().threads(2),
        GaiResolver::new(),
        sink.clone(),
    )
    .unwrap();
    assert!(runner.start("localhost", "80"));
    let command = runner.command().clone();
    runner.join();

    assert_eq!(command.state(), RaceState::Resolved);
    let addrs = sink.addrs();
    assert!(!addrs.is_empty());
    assert!(addrs.iter().all(|a| a.ip().is_loopback() && a.port() == 80));
    assert_eq!(command.outcome().addrs(), addrs.as_slice());
    // The timer was cancelled rather than left to expire.
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[test]
fn test_unresolvable_name_times_out() {
    let resolver = StalledResolver::default();
    let abandoned = resolver.abandoned.clone();

    let (outcome, addrs, elapsed) = race(2, resolver, "never.example");

    assert!(matches!(outcome, RaceOutcome::TimedOut));
    assert!(addrs.is_empty());
    assert!(elapsed >= SHORT_DEADLINE);
    assert!(abandoned.load(Ordering::SeqCst), "lookup should have been aborted");
}

#[test]
fn test_empty_answer_defers_to_timer() {
    let (outcome, addrs, elapsed) = race(
        2,
        FixedResolver {
            response: Ok(vec![]),
        },
        "empty.example",
    );

    assert!(matches!(outcome, RaceOutcome::TimedOut));
    assert!(addrs.is_empty());
    assert!(elapsed >= SHORT_DEADLINE);
}

#[test]
fn test_resolver_error_is_reported() {
    let (outcome, addrs, _) = race(
        2,
        FixedResolver {
            response: Err(NetError::NameNotResolved),
        },
        "nxdomain.example",
    );

    assert!(matches!(outcome, RaceOutcome::Failed(NetError::NameNotResolved)));
    assert!(addrs.is_empty());
}

#[test]
fn test_outcome_independent_of_thread_count() {
    let answer = vec![
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 0),
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)), 0),
    ];
    let resolver = || {
        let mut overrides = HashMap::new();
        overrides.insert(Cow::Borrowed("pinned.example"), answer.clone());
        DnsResolverWithOverrides::new(Arc::new(StalledResolver::default()), overrides)
    };

    let (one, one_addrs, _) = race(1, resolver(), "pinned.example");
    let (four, four_addrs, _) = race(4, resolver(), "pinned.example");

    assert_eq!(one.state(), RaceState::Resolved);
    assert_eq!(four.state(), RaceState::Resolved);
    assert_eq!(one_addrs, four_addrs);
    assert_eq!(
        one_addrs,
        vec![
            "192.0.2.1:80".parse::<SocketAddr>().unwrap(),
            "192.0.2.2:80".parse::<SocketAddr>().unwrap()
        ]
    );
}

#[test]
fn test_teardown_mid_race_joins_all_workers() {
    for threads in [1, 3, 8] {
        let runner = PoolRunner::with_resolver(
            config(threads),
            StalledResolver::default(),
            Arc::new(MemorySink::new()),
        )
        .unwrap();
        assert!(runner.start("never.example", "80"));
        let command = runner.command().clone();

        // Race still pending at this point; dropping must wait it out.
        drop(runner);
        assert_eq!(command.state(), RaceState::TimedOut);
    }
}

#[test]
fn test_join_reports_thread_count_mid_race() {
    let runner = PoolRunner::with_resolver(
        config(4),
        StalledResolver::default(),
        Arc::new(MemorySink::new()),
    )
    .unwrap();
    assert!(runner.start("never.example", "80"));
    assert_eq!(runner.join(), 4);
}

#[test]
fn test_race_runs_once_per_runner() {
    let sink = Arc::new(MemorySink::new());
    let runner = PoolRunner::with_resolver(
        config(2),
        FixedResolver {
            response: Ok(vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)]),
        },
        sink.clone(),
    )
    .unwrap();

    assert!(runner.start("once.example", "80"));
    assert!(!runner.start("twice.example", "80"));
    runner.join();

    assert_eq!(sink.addrs().len(), 1);
}

#[test]
fn test_malformed_input_fails_to_start() {
    let runner = PoolRunner::with_resolver(
        config(1),
        FixedResolver {
            response: Ok(vec![]),
        },
        Arc::new(MemorySink::new()),
    )
    .unwrap();

    assert!(!runner.start("has space", "80"));
    assert!(!runner.start("example.com", "-1"));
    assert!(!runner.command().is_armed());
    assert_eq!(runner.join(), 1);
}

/// A hickory resolver whose only name server is a local socket that reads
/// queries and never answers.
fn silent_hickory(server: &UdpSocket) -> HickoryResolver {
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(
        server.local_addr().unwrap(),
        Protocol::Udp,
    ));

    let mut options = ResolverOpts::default();
    options.timeout = Duration::from_secs(30);
    options.attempts = 1;
    options.use_hosts_file = ResolveHosts::Never;

    HickoryResolver::with_config(config, options)
}

#[test]
fn test_hickory_ip_literal_resolves() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let (outcome, addrs, _) = race(4, silent_hickory(&server), "127.0.0.1");

    assert_eq!(outcome.state(), RaceState::Resolved);
    assert_eq!(addrs, vec!["127.0.0.1:80".parse::<SocketAddr>().unwrap()]);
}

#[test]
fn test_hickory_lookup_abandoned_at_deadline() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let (outcome, addrs, elapsed) = race(2, silent_hickory(&server), "silent.example");

    assert!(matches!(outcome, RaceOutcome::TimedOut));
    assert!(addrs.is_empty());
    assert!(elapsed >= SHORT_DEADLINE);
    // Well short of hickory's own 30 s query timeout.
    assert!(elapsed < Duration::from_secs(10));

    // The query really went out before the deadline cut it off.
    let mut buf = [0u8; 512];
    let (len, _) = server.recv_from(&mut buf).unwrap();
    assert!(len > 12, "expected a DNS query, got {len} bytes");
}

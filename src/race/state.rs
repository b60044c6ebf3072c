use crate::base::neterror::NetError;
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU8, Ordering},
};

/// Completion flag of a race.
///
/// Moves from `Pending` to exactly one terminal state and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RaceState {
    /// Neither side has won yet.
    #[default]
    Pending = 0,

    /// The resolver answered with at least one address before the deadline.
    Resolved = 1,

    /// The deadline elapsed first.
    TimedOut = 2,

    /// The resolver reported an error before the deadline.
    Failed = 3,
}

impl RaceState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RaceState::Resolved,
            2 => RaceState::TimedOut,
            3 => RaceState::Failed,
            _ => RaceState::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != RaceState::Pending
    }
}

/// Atomic cell holding a [`RaceState`].
#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn load(&self) -> RaceState {
        RaceState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `Pending -> to`. Returns false if another transition got there
    /// first, in which case the caller lost the race.
    pub(crate) fn finish(&self, to: RaceState) -> bool {
        debug_assert!(to.is_terminal());
        self.0
            .compare_exchange(
                RaceState::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// What a race ended with.
#[derive(Debug, Clone, Default)]
pub enum RaceOutcome {
    #[default]
    Pending,
    /// Every address the winning lookup produced, with the target port set.
    Resolved(Vec<SocketAddr>),
    TimedOut,
    Failed(NetError),
}

impl RaceOutcome {
    pub fn state(&self) -> RaceState {
        match self {
            RaceOutcome::Pending => RaceState::Pending,
            RaceOutcome::Resolved(_) => RaceState::Resolved,
            RaceOutcome::TimedOut => RaceState::TimedOut,
            RaceOutcome::Failed(_) => RaceState::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RaceOutcome::Pending)
    }

    /// Addresses of a resolved race; empty otherwise.
    pub fn addrs(&self) -> &[SocketAddr] {
        match self {
            RaceOutcome::Resolved(addrs) => addrs,
            _ => &[],
        }
    }
}

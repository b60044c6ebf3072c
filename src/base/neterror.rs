use std::{io, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Generic Errors
    #[error("Operation aborted")]
    Aborted,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Timed out")]
    TimedOut,
    #[error("Unexpected error")]
    Unexpected,

    // Resolution Errors
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Name resolution failed")]
    NameResolutionFailed,

    // Race Errors (custom range, outside Chromium's table)
    #[error("Event loop stopped")]
    LoopStopped,
    #[error("Resolution already armed")]
    AlreadyArmed,

    // Context-rich variants
    #[error("Name not resolved for {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Aborted => -3,
            NetError::InvalidArgument => -4,
            NetError::TimedOut => -7,
            NetError::Unexpected => -9,

            NetError::NameNotResolved => -105,
            NetError::AddressInvalid => -108,
            NetError::NameResolutionFailed => -137,

            NetError::LoopStopped => -10000,
            NetError::AlreadyArmed => -10001,

            NetError::NameNotResolvedFor { .. } => -105,
        }
    }

    /// Builds a [`NetError::NameNotResolvedFor`] from an IO error.
    pub fn dns_failed(domain: &str, err: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(err),
        }
    }

    /// True for the status a cancelled operation completes with.
    pub fn is_aborted(&self) -> bool {
        matches!(self, NetError::Aborted)
    }
}

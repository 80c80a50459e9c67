//! In-flight guards: at most one outstanding operation of a kind.
//!
//! An [`InFlightFlag`] is a session-lifetime boolean. Acquiring it yields an
//! [`InFlightGuard`] that clears the flag when dropped, so every terminal
//! branch of a gallery load or swap job releases it, including early returns
//! and dropped tasks. The flag is a `Rc<Cell<bool>>`: the client runs on one
//! thread and the guard only has to survive re-entrant event handling.

use log::debug;
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

/// The operation kinds that are guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PartLoad,
    Swap,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::PartLoad => f.write_str("part load"),
            Operation::Swap => f.write_str("swap"),
        }
    }
}

/// A second operation was attempted while one of the same kind is in flight.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("a {0} is already in flight")]
pub struct ReentrancyRejected(pub Operation);

#[derive(Debug, Clone)]
pub struct InFlightFlag {
    operation: Operation,
    busy: Rc<Cell<bool>>,
}

impl InFlightFlag {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            busy: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_set(&self) -> bool {
        self.busy.get()
    }

    /// Set the flag, or report that it is already set.
    pub fn try_acquire(&self) -> Result<InFlightGuard, ReentrancyRejected> {
        if self.busy.replace(true) {
            return Err(ReentrancyRejected(self.operation));
        }
        Ok(InFlightGuard {
            operation: self.operation,
            busy: Rc::clone(&self.busy),
        })
    }
}

/// Holding this value means the operation is in flight.
#[derive(Debug)]
pub struct InFlightGuard {
    operation: Operation,
    busy: Rc<Cell<bool>>,
}

impl InFlightGuard {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.set(false);
        debug!("{} guard released", self.operation);
    }
}

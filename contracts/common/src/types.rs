//! Core Types for the Stablecoin Protocol
//!
//! Address and integer types come from `alloy-primitives`; this module adds
//! collateral pool identifiers and the per-call execution context.

use core::mem;

pub use alloy_primitives::{Address, B256, I256, U256};

use crate::errors::{StablecoinError, StablecoinResult};
use crate::events::{EventLog, StablecoinEvent};

/// Collateral pool identifier (`bytes32`)
pub type CollateralPoolId = B256;

/// Pool id from a short name, right-padded like `formatBytes32String`
///
/// Names must fit in 31 bytes so the id stays a valid C string.
pub fn pool_id(name: &str) -> StablecoinResult<CollateralPoolId> {
    let bytes = name.as_bytes();
    if bytes.len() > 31 {
        return Err(StablecoinError::InvalidInput {
            contract: "CollateralPoolId",
            reason: "name-too-long",
        });
    }
    let mut id = [0u8; 32];
    id[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::from(id))
}

/// Pool name with trailing zero padding removed
pub fn pool_name(id: &CollateralPoolId) -> String {
    let bytes = id.as_slice();
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Execution context of one external call
///
/// `sender` plays `msg.sender`, `timestamp` plays `block.timestamp`, and
/// `events` collects everything the call emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub timestamp: u64,
    pub events: EventLog,
}

impl CallContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self {
            sender,
            timestamp,
            events: EventLog::new(),
        }
    }

    /// Run `f` with `caller` as the sender, as a contract calling another
    /// contract does. The original sender is restored afterwards.
    pub fn call_as<T>(&mut self, caller: Address, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = mem::replace(&mut self.sender, caller);
        let result = f(self);
        self.sender = previous;
        result
    }

    pub fn emit(&mut self, event: StablecoinEvent) {
        self.events.emit(event);
    }

    /// Move block time forward
    pub fn advance(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    /// Position in the event log to revert to
    pub fn checkpoint(&self) -> usize {
        self.events.len()
    }

    /// Drop events emitted after `checkpoint`
    pub fn revert_to(&mut self, checkpoint: usize) {
        self.events.truncate(checkpoint);
    }
}

//! Addressed-bus capability for I2C devices.
//!
//! Several boards usually share one physical bus, each selected by its 7-bit
//! address. The host opens the bus once and hands the same [`SharedBus`] to
//! every driver that needs it; drivers never own the bus lifecycle.
//!
//! Implementations take `&self` and are responsible for serializing
//! transactions on the wire.

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Read/write primitives of an addressed bus.
pub trait I2cBus: Send + Sync {
    /// Read `len` bytes from the device at `addr`.
    fn read_bytes(&self, addr: u8, len: usize) -> Result<Vec<u8>>;

    /// Write `data` to the device at `addr`.
    fn write_bytes(&self, addr: u8, data: &[u8]) -> Result<()>;

    /// Read `len` bytes starting at register `reg`.
    fn read_from_reg(&self, addr: u8, reg: u8, len: usize) -> Result<Vec<u8>>;

    /// Write `data` starting at register `reg`.
    fn write_to_reg(&self, addr: u8, reg: u8, data: &[u8]) -> Result<()>;
}

/// Bus handle shared between the host and its drivers.
pub type SharedBus = Arc<dyn I2cBus>;

// =============================================================================
// MockBus
// =============================================================================

/// One recorded write on a [`MockBus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusWrite {
    /// Target address
    pub addr: u8,
    /// Register, for register writes
    pub reg: Option<u8>,
    /// Payload
    pub data: Vec<u8>,
}

#[derive(Default)]
struct MockBusState {
    writes: Vec<BusWrite>,
    responses: HashMap<u8, VecDeque<Vec<u8>>>,
}

/// In-memory bus for tests and simulation.
///
/// Records every write and answers reads from per-address response queues.
/// Reading from an address with no queued response fails like a NACK would.
#[derive(Default)]
pub struct MockBus {
    state: Mutex<MockBusState>,
}

impl MockBus {
    /// Create an empty mock bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mock bus in an `Arc`.
    ///
    /// The concrete handle keeps [`writes`](Self::writes) reachable; clone it
    /// into a [`SharedBus`] for drivers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue a response for the next read from `addr`.
    pub fn push_response(&self, addr: u8, data: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .responses
            .entry(addr)
            .or_default()
            .push_back(data.into());
    }

    /// All writes seen so far, oldest first.
    pub fn writes(&self) -> Vec<BusWrite> {
        self.state.lock().writes.clone()
    }

    fn next_response(&self, addr: u8, len: usize) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        let mut data = state
            .responses
            .get_mut(&addr)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| anyhow!("no response from device at 0x{:02X}", addr))?;
        data.resize(len, 0);
        tracing::trace!(addr, len, "MockBus read");
        Ok(data)
    }

    fn record(&self, addr: u8, reg: Option<u8>, data: &[u8]) {
        tracing::trace!(addr, ?reg, len = data.len(), "MockBus write");
        self.state.lock().writes.push(BusWrite {
            addr,
            reg,
            data: data.to_vec(),
        });
    }
}

impl I2cBus for MockBus {
    fn read_bytes(&self, addr: u8, len: usize) -> Result<Vec<u8>> {
        self.next_response(addr, len)
    }

    fn write_bytes(&self, addr: u8, data: &[u8]) -> Result<()> {
        self.record(addr, None, data);
        Ok(())
    }

    fn read_from_reg(&self, addr: u8, _reg: u8, len: usize) -> Result<Vec<u8>> {
        self.next_response(addr, len)
    }

    fn write_to_reg(&self, addr: u8, reg: u8, data: &[u8]) -> Result<()> {
        self.record(addr, Some(reg), data);
        Ok(())
    }
}

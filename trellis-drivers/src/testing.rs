//! Test doubles for driver tests

use std::collections::HashMap;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use trellis_hal::{I2cBusError, RegisterBus};

/// One bus transaction as seen by [`MockBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Read { address: u8, register: u8, len: usize },
    Write { address: u8, register: u8, data: Vec<u8> },
}

impl Transaction {
    pub fn write(address: u8, register: u8, data: &[u8]) -> Self {
        Transaction::Write {
            address,
            register,
            data: data.to_vec(),
        }
    }

    pub fn read(address: u8, register: u8, len: usize) -> Self {
        Transaction::Read {
            address,
            register,
            len,
        }
    }
}

/// Register-file bus that records every transaction
///
/// Writes store bytes with register auto-increment; reads return what was
/// stored (or zero). Pinned registers always read back their pinned value.
/// Failed transactions are recorded too, before the error is returned.
#[derive(Debug, Default)]
pub struct MockBus {
    registers: HashMap<(u8, u8), u8>,
    pinned: HashMap<(u8, u8), u8>,
    log: Vec<Transaction>,
    fail_at: Option<usize>,
    fail_all: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a 16-bit big-endian register value
    pub fn set_register16(&mut self, address: u8, register: u8, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.registers.insert((address, register), hi);
        self.registers.insert((address, register.wrapping_add(1)), lo);
    }

    /// Make a register always read back `value`
    pub fn pin_register(&mut self, address: u8, register: u8, value: u8) {
        self.pinned.insert((address, register), value);
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.registers
            .get(&(address, register))
            .copied()
            .unwrap_or(0)
    }

    /// Fail the transaction with this index (0-based, counting all attempts)
    pub fn fail_at(&mut self, index: usize) {
        self.fail_at = Some(index);
    }

    /// Fail every transaction from now on
    pub fn fail_all(&mut self, fail: bool) {
        self.fail_all = fail;
    }

    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    /// Written payloads in order, as `(register, data)`
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { register, data, .. } => Some((*register, data.clone())),
                Transaction::Read { .. } => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn record(&mut self, transaction: Transaction) -> Result<(), I2cBusError> {
        let index = self.log.len();
        self.log.push(transaction);
        if self.fail_all || self.fail_at == Some(index) {
            Err(I2cBusError::Nack)
        } else {
            Ok(())
        }
    }
}

impl RegisterBus for MockBus {
    type Error = I2cBusError;

    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.record(Transaction::read(address, register, buf.len()))?;
        for (i, byte) in buf.iter_mut().enumerate() {
            let key = (address, register.wrapping_add(i as u8));
            *byte = match self.pinned.get(&key) {
                Some(value) => *value,
                None => self.registers.get(&key).copied().unwrap_or(0),
            };
        }
        Ok(())
    }

    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        self.record(Transaction::write(address, register, data))?;
        for (i, byte) in data.iter().enumerate() {
            self.registers
                .insert((address, register.wrapping_add(i as u8)), *byte);
        }
        Ok(())
    }
}

/// I2C master with one 256-byte register file per device address
///
/// The first byte written in a transaction selects the register; further
/// bytes and reads auto-increment from there. Unknown addresses NACK.
#[derive(Debug, Default)]
pub struct FakeI2c {
    devices: HashMap<u8, [u8; 256]>,
    /// Target address of every transaction, in order
    pub transactions: Vec<u8>,
}

impl FakeI2c {
    pub fn with_devices(addresses: &[u8]) -> Self {
        Self {
            devices: addresses.iter().map(|&a| (a, [0u8; 256])).collect(),
            transactions: Vec::new(),
        }
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.devices
            .get(&address)
            .map_or(0, |regs| regs[register as usize])
    }

    pub fn set_register16(&mut self, address: u8, register: u8, value: u16) {
        if let Some(regs) = self.devices.get_mut(&address) {
            let [hi, lo] = value.to_be_bytes();
            regs[register as usize] = hi;
            regs[register.wrapping_add(1) as usize] = lo;
        }
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.transactions.push(address);
        let regs = self
            .devices
            .get_mut(&address)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;

        let mut pointer: Option<u8> = None;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    for &b in bytes.iter() {
                        match pointer {
                            Some(p) => {
                                regs[p as usize] = b;
                                pointer = Some(p.wrapping_add(1));
                            }
                            None => pointer = Some(b),
                        }
                    }
                }
                Operation::Read(buf) => {
                    let mut p = pointer.unwrap_or(0);
                    for b in buf.iter_mut() {
                        *b = regs[p as usize];
                        p = p.wrapping_add(1);
                    }
                    pointer = Some(p);
                }
            }
        }
        Ok(())
    }
}

/// Delay that records requested durations instead of waiting
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub delays_ns: Vec<u64>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays in whole milliseconds
    pub fn delays_ms(&self) -> Vec<u64> {
        self.delays_ns.iter().map(|ns| ns / 1_000_000).collect()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ns.push(ms as u64 * 1_000_000);
    }
}

//! I2C register bus abstractions
//!
//! Provides the register-level contract used by every Trellis driver and an
//! adapter for `embedded-hal` I2C masters.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, Operation};

/// Register-addressed bus master
///
/// Both operations block until the transaction completes or fails. The
/// contract imposes no timeout; bounding the I/O is up to the transport.
///
/// Writes are not idempotent: a failed write may still have changed the
/// device registers.
pub trait RegisterBus {
    /// Error type for bus transactions
    type Error;

    /// Read `buf.len()` bytes starting at `register` of the device at `address`
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - Register index to start reading from
    /// * `buf` - Buffer to read into
    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Write `data` starting at `register` of the device at `address`
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - Register index to start writing at
    /// * `data` - Bytes to write
    fn write_register(&mut self, address: u8, register: u8, data: &[u8])
        -> Result<(), Self::Error>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    type Error = B::Error;

    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).read_register(address, register, buf)
    }

    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        (**self).write_register(address, register, data)
    }
}

/// Error from I2C transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cBusError {
    /// Bus error
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// NACK received (address or data)
    Nack,
    /// Overrun
    Overrun,
    /// Other error
    Other,
}

impl From<ErrorKind> for I2cBusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => I2cBusError::Bus,
            ErrorKind::ArbitrationLoss => I2cBusError::ArbitrationLost,
            ErrorKind::NoAcknowledge(_) => I2cBusError::Nack,
            ErrorKind::Overrun => I2cBusError::Overrun,
            _ => I2cBusError::Other,
        }
    }
}

/// [`RegisterBus`] on top of an `embedded-hal` I2C master
///
/// - Reads are a write of the register index followed by a repeated-start
///   read.
/// - Writes send the register index and the payload as one transaction with
///   no repeated start in between, which is how register-addressed I2C
///   devices expect auto-incremented writes.
pub struct HalI2c<I> {
    i2c: I,
}

impl<I: I2c> HalI2c<I> {
    /// Wrap an already configured I2C master
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Release the underlying I2C master
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterBus for HalI2c<I> {
    type Error = I2cBusError;

    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(address, &[register], buf)
            .map_err(|e| e.kind().into())
    }

    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // Adjacent write operations are sent back to back without SR/SP
        let mut ops = [Operation::Write(&[register]), Operation::Write(data)];
        self.i2c
            .transaction(address, &mut ops)
            .map_err(|e| e.kind().into())
    }
}

//! Driver errors

/// Error from a driver operation
///
/// `E` is the transport error of the underlying bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Transport(E),
    /// Channel index above 15
    InvalidChannel(u8),
    /// Pulse width neither 0 nor within 500..=3000 µs
    InvalidPulseWidth(u16),
    /// Operation needs a configured device
    NotConfigured,
}

impl<E> Error<E> {
    /// Check if the error came from the bus rather than from validation
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transport() {
        assert!(Error::Transport(()).is_transport());
        assert!(!Error::<()>::InvalidChannel(16).is_transport());
        assert!(!Error::<()>::InvalidPulseWidth(499).is_transport());
        assert!(!Error::<()>::NotConfigured.is_transport());
    }
}

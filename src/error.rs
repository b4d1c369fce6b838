//! Unified error type for the badge runtime.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A registry is at capacity. Non-fatal: capacities are fixed at build
    /// time, so this is a sizing signal for the caller.
    RegistryFull(RegistryKind),

    /// The radio stack or another hardware driver reported a failure.
    /// Fatal: the application must reset rather than run with a
    /// half-configured link.
    Driver(DriverError),
}

/// Which bounded registry rejected a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryKind {
    Connectivity,
    UuidProvider,
    Button,
}

/// Failures reported by a `RadioDriver` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Raw error code from the SoftDevice.
    Raw(u32),
    /// The stack rejected the call in its current state.
    InvalidState,
    /// Advertising data does not fit the on-air limit.
    DataSize,
    /// The command queue towards the radio task is full.
    Busy,
}

impl Error {
    /// Driver failures must end in a reset; everything else is reported.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Driver(_))
    }
}

// Convenience conversions

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

//! Monotonic tick source consumed by the input pipeline.

/// A raw reading of the monotonic counter (32.768 kHz RTC on target).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(pub u32);

/// Free-running counter. Implementations must be callable from any context
/// and never block.
pub trait TickSource {
    fn now(&self) -> Tick;

    /// Ticks elapsed from `earlier` to `later`, correct across one wrap of
    /// the counter.
    fn diff(&self, later: Tick, earlier: Tick) -> u32 {
        later.0.wrapping_sub(earlier.0)
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }

    fn diff(&self, later: Tick, earlier: Tick) -> u32 {
        (**self).diff(later, earlier)
    }
}

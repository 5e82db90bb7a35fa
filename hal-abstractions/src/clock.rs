//! Monotonic time source

/// Monotonic millisecond clock
///
/// The value only needs to be monotonic, not wall-clock time. Consumers
/// compare instants with wrapping arithmetic, so a counter that wraps is
/// tolerated as long as intervals stay well below the wrap period.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin (usually boot)
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Clock backed by the embassy time driver
#[cfg(any(feature = "embassy", test))]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(any(feature = "embassy", test))]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

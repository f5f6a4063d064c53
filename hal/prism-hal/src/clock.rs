//! Time source abstraction

/// Free-running microsecond counter
///
/// Wraps every ~71 minutes; callers measure intervals with
/// `wrapping_sub`, never absolute values.
pub trait Clock {
    /// Current counter value in microseconds
    fn now_us(&self) -> u32;

    /// Microseconds elapsed since `start`
    fn elapsed_us(&self, start: u32) -> u32 {
        self.now_us().wrapping_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

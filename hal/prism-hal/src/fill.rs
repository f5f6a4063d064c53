//! Memory fill engine abstraction
//!
//! On the RP2040 a spare DMA channel can replicate one 32-bit word across
//! a buffer without CPU involvement, which is how core 0 clears its half
//! of a surface while core 1 clears the other.

/// Asynchronous 32-bit memory fill
pub trait WordFill {
    /// Start filling every word of `dst` with `word`
    ///
    /// Returns as soon as the fill is running. At most one fill is in
    /// flight; implementations wait for the previous one first.
    ///
    /// # Safety
    ///
    /// `dst` is written behind the borrow checker's back until [`wait`]
    /// returns. The caller must keep the memory alive and must neither
    /// read nor write it before then.
    ///
    /// [`wait`]: WordFill::wait
    #[allow(unsafe_code)]
    unsafe fn start(&mut self, dst: &mut [u32], word: u32);

    /// Block until the running fill (if any) has completed
    fn wait(&mut self);

    /// Check whether a fill is still running
    fn is_busy(&self) -> bool;

    /// Fill `dst` and wait for completion
    fn fill(&mut self, dst: &mut [u32], word: u32) {
        // SAFETY: `dst` stays mutably borrowed until `wait` returns below.
        #[allow(unsafe_code)]
        unsafe {
            self.start(dst, word);
        }
        self.wait();
    }
}

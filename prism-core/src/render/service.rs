//! Submitting side of the render rendezvous

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::job::RawJob;
use super::{JobReport, RenderError, RenderJob};

pub(super) enum Message {
    Run(RawJob),
    Shutdown,
}

/// Pair of single-slot channels between the two cores
///
/// Lives in a `static` on target so both cores can reach it.
pub struct RenderLink {
    pub(super) jobs: Channel<CriticalSectionRawMutex, Message, 1>,
    pub(super) done: Channel<CriticalSectionRawMutex, JobReport, 1>,
}

impl RenderLink {
    pub const fn new() -> Self {
        Self {
            jobs: Channel::new(),
            done: Channel::new(),
        }
    }
}

impl Default for RenderLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Core 0 handle to the render worker
pub struct RenderService<'l> {
    link: &'l RenderLink,
    outstanding: bool,
    busy_us: u32,
    jobs: u32,
}

impl<'l> RenderService<'l> {
    pub const fn new(link: &'l RenderLink) -> Self {
        Self {
            link,
            outstanding: false,
            busy_us: 0,
            jobs: 0,
        }
    }

    /// Hand `job` to the worker and return immediately
    ///
    /// Fails with [`RenderError::ProtocolMisuse`] while a previous job is
    /// still outstanding.
    ///
    /// # Safety
    ///
    /// The worker writes the job's region after this returns. The caller
    /// must keep that memory alive and must not access it until
    /// [`wait`](Self::wait) has returned. [`scope`](Self::scope) is the
    /// safe wrapper.
    #[allow(unsafe_code)]
    pub unsafe fn submit(&mut self, job: RenderJob<'_>) -> Result<(), RenderError> {
        if self.outstanding {
            return Err(RenderError::ProtocolMisuse);
        }
        let raw = job.region.into_raw(job.kind);
        block_on(self.link.jobs.send(Message::Run(raw)));
        self.outstanding = true;
        Ok(())
    }

    /// Block until the outstanding job has completed
    pub fn wait(&mut self) -> Result<JobReport, RenderError> {
        if !self.outstanding {
            return Err(RenderError::ProtocolMisuse);
        }
        let report = block_on(self.link.done.receive());
        self.outstanding = false;
        self.busy_us = self.busy_us.wrapping_add(report.busy_us);
        self.jobs = self.jobs.wrapping_add(1);
        Ok(report)
    }

    /// Run `job` on the worker while `local` runs on this core
    ///
    /// Returns once both are done. The job's region stays borrowed for the
    /// whole call, so nothing can touch it while the worker owns it.
    pub fn scope<R>(
        &mut self,
        job: RenderJob<'_>,
        local: impl FnOnce() -> R,
    ) -> Result<R, RenderError> {
        // SAFETY: the region is borrowed until this function returns, and
        // `Pending` waits for the worker on every exit path.
        #[allow(unsafe_code)]
        unsafe {
            self.submit(job)?;
        }
        let mut pending = Pending {
            service: self,
            armed: true,
        };
        let value = local();
        pending.armed = false;
        pending.service.wait()?;
        Ok(value)
    }

    /// Stop the worker loop and wait for it to acknowledge
    pub fn shutdown(&mut self) -> Result<(), RenderError> {
        if self.outstanding {
            return Err(RenderError::ProtocolMisuse);
        }
        block_on(self.link.jobs.send(Message::Shutdown));
        block_on(self.link.done.receive());
        Ok(())
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    /// Worker busy time accumulated since the last reset
    pub fn busy_us(&self) -> u32 {
        self.busy_us
    }

    /// Jobs completed since the last reset
    pub fn jobs(&self) -> u32 {
        self.jobs
    }

    pub fn reset_stats(&mut self) {
        self.busy_us = 0;
        self.jobs = 0;
    }
}

/// Waits for the worker if `scope` unwinds
struct Pending<'s, 'l> {
    service: &'s mut RenderService<'l>,
    armed: bool,
}

impl Drop for Pending<'_, '_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.service.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::mock::FakeClock;
    use crate::pixel::PixelFormat;
    use crate::render::{run_worker, SurfaceRegion};
    use crate::surface::Surface;

    fn paint_marker(region: &mut SurfaceRegion<'_>) {
        region.bytes_mut().fill(0xAB);
    }

    #[test]
    fn test_wait_without_submit_is_misuse() {
        let link = RenderLink::new();
        let mut service = RenderService::new(&link);
        assert_eq!(service.wait(), Err(RenderError::ProtocolMisuse));
    }

    #[test]
    fn test_double_submit_rejected() {
        let link = RenderLink::new();
        let mut a = Surface::new(16, 4, PixelFormat::Rgb565).unwrap();
        let mut b = Surface::new(16, 4, PixelFormat::Rgb565).unwrap();

        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(5)));

            let mut service = RenderService::new(&link);
            let (_, first) = SurfaceRegion::split(&mut a, 64).unwrap();
            let (_, second) = SurfaceRegion::split(&mut b, 64).unwrap();

            #[allow(unsafe_code)]
            unsafe {
                service.submit(RenderJob::clear(first, 0xFFFF)).unwrap();
                assert_eq!(
                    service.submit(RenderJob::clear(second, 0xFFFF)),
                    Err(RenderError::ProtocolMisuse)
                );
            }
            assert!(service.is_outstanding());
            assert_eq!(service.wait(), Ok(JobReport { busy_us: 5 }));
            assert!(!service.is_outstanding());
            service.shutdown().unwrap();
        });

        // Only the first job ran
        assert_eq!(a.pixel(0, 2), Some(0xFFFF));
        assert_eq!(b.pixel(0, 2), Some(0));
    }

    #[test]
    fn test_scope_runs_both_sides() {
        let link = RenderLink::new();
        let mut surface = Surface::new(8, 8, PixelFormat::Rgb332).unwrap();

        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(3)));

            let mut service = RenderService::new(&link);
            for _ in 0..4 {
                let (head, region) = SurfaceRegion::split(&mut surface, 32).unwrap();
                let job = RenderJob::callback(region, paint_marker);
                let head_len = service.scope(job, || {
                    head.fill(0x1111_1111);
                    head.len()
                });
                assert_eq!(head_len, Ok(8));
            }
            assert_eq!(service.jobs(), 4);
            assert_eq!(service.busy_us(), 12);
            service.reset_stats();
            assert_eq!(service.busy_us(), 0);
            service.shutdown().unwrap();
        });

        assert!(surface.bytes()[..32].iter().all(|&b| b == 0x11));
        assert!(surface.bytes()[32..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_shutdown_refused_while_outstanding() {
        let link = RenderLink::new();
        let mut surface = Surface::new(4, 4, PixelFormat::Rgb565).unwrap();

        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(1)));

            let mut service = RenderService::new(&link);
            let (_, region) = SurfaceRegion::split(&mut surface, 16).unwrap();
            #[allow(unsafe_code)]
            unsafe {
                service.submit(RenderJob::clear(region, 0)).unwrap();
            }
            assert_eq!(service.shutdown(), Err(RenderError::ProtocolMisuse));
            service.wait().unwrap();
            service.shutdown().unwrap();
        });
    }
}

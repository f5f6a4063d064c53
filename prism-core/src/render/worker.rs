//! Worker side of the render rendezvous

use embassy_futures::block_on;
use prism_hal::Clock;

use super::service::Message;
use super::{JobReport, RenderLink};

/// Serve render jobs until a shutdown message arrives
///
/// Runs on the second core. Every job, shutdown included, is answered
/// with one [`JobReport`] carrying the time spent on it.
pub fn run_worker<C: Clock>(link: &RenderLink, clock: &C) {
    loop {
        let message = block_on(link.jobs.receive());
        let start = clock.now_us();

        let stop = match message {
            Message::Run(job) => {
                // SAFETY: the submitter lent the region and waits for the
                // report below before touching it again.
                #[allow(unsafe_code)]
                unsafe {
                    job.execute()
                };
                false
            }
            Message::Shutdown => true,
        };

        let report = JobReport {
            busy_us: clock.elapsed_us(start),
        };
        block_on(link.done.send(report));

        if stop {
            return;
        }
    }
}

//! Headless frame driver.
//!
//! Hosts with a render loop call [`MotionScheduler::tick`] themselves and
//! let their executor poll the futures. Without one (tests, the CLI) a
//! future can be driven to completion here: poll, tick one frame, repeat.

use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::task::noop_waker_ref;

use crate::error::{MotionError, Result};
use crate::scheduler::MotionScheduler;

/// Run `future` to completion, ticking `scheduler` by `frame` between
/// polls.
///
/// Fails with [`MotionError::Stalled`] when the future is still pending
/// but no motion is left that could wake it.
pub fn drive_frames<F: Future>(scheduler: &MotionScheduler, frame: Duration, future: F) -> Result<F::Output> {
    if frame.is_zero() {
        return Err(MotionError::ZeroFrameStep);
    }
    let mut future = pin!(future);
    let mut cx = Context::from_waker(noop_waker_ref());
    let mut frames = 0u64;
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            tracing::debug!("future settled after {frames} frames");
            return Ok(output);
        }
        if scheduler.active_count() == 0 {
            return Err(MotionError::Stalled);
        }
        scheduler.tick(frame);
        frames += 1;
    }
}

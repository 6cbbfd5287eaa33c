//! In-memory simulated driver.
//!
//! `SimDriver` stands in for a live browser host: it advances its own frame
//! counter, records every call it receives, and synthesizes capture bytes.
//! Integration tests use the call log to assert ordering, and the CLI dry
//! run uses it to replay a script with no host attached. Individual
//! operations can be armed to fail so error propagation is testable.

use crate::error::{DriverError, DriverResult};
use crate::exec::driver::{Driver, PointerEvent, Snapshot};

/// One driver operation, named for arming simulated failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOp {
    /// `run_frames`
    RunFrames,
    /// `apply_input`
    ApplyInput,
    /// `capture_snapshot`
    CaptureSnapshot,
    /// `read_frame_count`
    ReadFrameCount,
}

impl SimOp {
    fn name(self) -> &'static str {
        match self {
            Self::RunFrames => "runFrames",
            Self::ApplyInput => "applyInput",
            Self::CaptureSnapshot => "captureSnapshot",
            Self::ReadFrameCount => "readFrameCount",
        }
    }
}

/// One call observed by the simulated driver, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// The executor requested a frame advance.
    RunFrames {
        /// Requested frame count.
        frames: u32,
    },
    /// The executor delivered a pointer event.
    ApplyInput {
        /// The absolute-pixel event as received.
        event: PointerEvent,
    },
    /// The executor requested a capture.
    CaptureSnapshot,
    /// The executor read the final frame counter.
    ReadFrameCount,
}

/// Scripted stand-in for a live host.
#[derive(Debug, Default)]
pub struct SimDriver {
    frame: u64,
    calls: Vec<DriverCall>,
    fail_on: Option<SimOp>,
}

impl SimDriver {
    /// Create a driver with a zeroed frame counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the named operation to fail on every invocation.
    pub fn failing_on(mut self, op: SimOp) -> Self {
        self.fail_on = Some(op);
        self
    }

    /// Calls observed so far, in arrival order.
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Current simulated frame counter.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn check(&self, op: SimOp) -> DriverResult<()> {
        if self.fail_on == Some(op) {
            return Err(DriverError::new(op.name(), "simulated failure"));
        }
        Ok(())
    }
}

impl Driver for SimDriver {
    async fn run_frames(&mut self, frames: u32) -> DriverResult<()> {
        self.check(SimOp::RunFrames)?;
        self.calls.push(DriverCall::RunFrames { frames });
        self.frame += u64::from(frames);
        Ok(())
    }

    async fn apply_input(&mut self, event: PointerEvent) -> DriverResult<()> {
        self.check(SimOp::ApplyInput)?;
        self.calls.push(DriverCall::ApplyInput { event });
        Ok(())
    }

    async fn capture_snapshot(&mut self) -> DriverResult<Snapshot> {
        self.check(SimOp::CaptureSnapshot)?;
        self.calls.push(DriverCall::CaptureSnapshot);
        Ok(Snapshot {
            frame: self.frame,
            image: format!("sim-frame-{}", self.frame).into_bytes(),
        })
    }

    async fn read_frame_count(&mut self) -> DriverResult<u64> {
        self.check(SimOp::ReadFrameCount)?;
        self.calls.push(DriverCall::ReadFrameCount);
        Ok(self.frame)
    }
}

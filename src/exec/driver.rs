//! Driver capability contract.
//!
//! The executor depends only on this trait, never on a concrete host. All
//! four operations are asynchronous and fallible; each one must have fully
//! applied its effects on the host before its future resolves, because the
//! executor relies on that for step ordering and never issues two driver
//! calls concurrently.

use serde::Serialize;

use crate::error::DriverResult;
use crate::script::{EmitMode, PointerAction};

/// One synthetic pointer event in absolute client pixels, ready for host
/// delivery. `source` carries the script's `emit` mode verbatim; a `both`
/// event stays one logical event and is never split by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerEvent {
    /// Pointer action to deliver.
    pub action: PointerAction,
    /// Pointer identifier from the script, unchanged.
    #[serde(rename = "pointerId")]
    pub pointer_id: i64,
    /// Absolute horizontal client position.
    #[serde(rename = "clientX")]
    pub client_x: f64,
    /// Absolute vertical client position.
    #[serde(rename = "clientY")]
    pub client_y: f64,
    /// Event family the host should emit.
    pub source: EmitMode,
}

/// One still image captured by the host, with the host's frame counter at
/// the moment of capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Host-reported cumulative frame count at capture time.
    pub frame: u64,
    /// Opaque encoded image bytes.
    pub image: Vec<u8>,
}

/// Capability object that advances and observes the host under test.
///
/// The only side-effecting dependency of the engine. A failed call aborts
/// the in-progress execution immediately with no retry.
pub trait Driver {
    /// Advance the host simulation by `frames` discrete frames; resolves
    /// once all frames have been applied.
    fn run_frames(&mut self, frames: u32) -> impl Future<Output = DriverResult<()>> + Send;

    /// Deliver one synthetic pointer event to the host; resolves once the
    /// event has been applied.
    fn apply_input(&mut self, event: PointerEvent) -> impl Future<Output = DriverResult<()>> + Send;

    /// Capture the host's current frame as an encoded still image.
    fn capture_snapshot(&mut self) -> impl Future<Output = DriverResult<Snapshot>> + Send;

    /// Read the host's authoritative cumulative frame counter.
    fn read_frame_count(&mut self) -> impl Future<Output = DriverResult<u64>> + Send;
}

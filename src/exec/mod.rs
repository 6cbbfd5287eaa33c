//! Step executor: sequential replay of a validated protocol.
//!
//! The executor walks a [`Protocol`] in order, dispatching each step to a
//! [`Driver`] and awaiting completion before the next is issued. A wall
//! clock (injectable for tests) bounds the whole replay: the budget is
//! re-checked synchronously before every step and once after the last, so
//! an overrun produces a deterministic failure naming the step in flight
//! rather than an opaque timeout. An in-flight driver call is never
//! interrupted; only the next step is prevented from starting.

/// Driver capability trait and its wire types.
pub mod driver;
/// In-memory simulated driver for tests and dry runs.
pub mod sim;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::{BudgetError, ExecResult};
use crate::script::{MAX_RUN_SECONDS, Protocol, Step};
use crate::viewport::{Viewport, to_client_position};
use driver::{Driver, PointerEvent};

/// Monotonic time source for the runtime budget.
///
/// Reports milliseconds since an arbitrary fixed epoch; the executor only
/// ever compares differences between readings.
pub trait Clock {
    /// Current reading in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Default clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    /// Create a wall clock with its epoch at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for tests.
///
/// Clones share the same reading, so a test can hold one handle while the
/// executor owns another and advance time between steps.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<Mutex<u64>>,
}

impl ManualClock {
    /// Create a manual clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        let mut now = self.now_ms.lock().unwrap_or_else(|err| err.into_inner());
        *now = now.saturating_add(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        *self.now_ms.lock().unwrap_or_else(|err| err.into_inner())
    }
}

/// Per-run execution options.
#[derive(Debug, Clone)]
pub struct ExecOptions<C = WallClock> {
    /// Wall-clock budget in seconds for the whole replay.
    pub max_run_seconds: u64,
    /// Time source for budget accounting.
    pub clock: C,
    /// Viewport used to scale normalized input positions.
    pub viewport: Viewport,
}

impl Default for ExecOptions<WallClock> {
    fn default() -> Self {
        Self {
            max_run_seconds: MAX_RUN_SECONDS,
            clock: WallClock::new(),
            viewport: Viewport::default(),
        }
    }
}

impl<C: Clock> ExecOptions<C> {
    /// Options with the reference budget and viewport but an injected clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            max_run_seconds: MAX_RUN_SECONDS,
            clock,
            viewport: Viewport::default(),
        }
    }
}

/// One recorded still image, in snap-step encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// Label from the script's snap step.
    pub label: String,
    /// Host-reported frame counter at the moment of capture.
    pub frame: u64,
    /// Opaque encoded image bytes.
    pub image: Vec<u8>,
}

/// Outcome of one successful replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// The host's authoritative cumulative frame counter after the last step.
    pub frame_count: u64,
    /// Captures in the same relative order as their snap steps.
    pub captures: Vec<Capture>,
}

/// Replay a validated protocol against a driver.
///
/// Steps are dispatched strictly sequentially; each driver call is awaited
/// to completion before the next step starts. Fails with
/// [`BudgetError`](crate::error::BudgetError) when the wall-clock budget
/// runs out, or propagates the first
/// [`DriverError`](crate::error::DriverError) verbatim. Steps already
/// applied to the driver are never rolled back.
pub async fn execute<D, C>(
    protocol: &Protocol,
    driver: &mut D,
    options: ExecOptions<C>,
) -> ExecResult<ExecutionResult>
where
    D: Driver,
    C: Clock,
{
    let budget_ms = options.max_run_seconds.saturating_mul(1000);
    let start_ms = options.clock.now_ms();
    let mut captures = Vec::new();

    for (index, step) in protocol.steps().iter().enumerate() {
        check_budget(&options, start_ms, budget_ms, index)?;

        match step {
            Step::Run { frames } => {
                tracing::debug!(step = index, frames, "run");
                driver.run_frames(*frames).await?;
            }
            Step::Input(input) => {
                let (client_x, client_y) = to_client_position(input, &options.viewport);
                let event = PointerEvent {
                    action: input.action,
                    pointer_id: input.pointer_id,
                    client_x,
                    client_y,
                    source: input.emit,
                };
                tracing::debug!(step = index, ?event, "input");
                driver.apply_input(event).await?;
            }
            Step::Snap { label } => {
                tracing::debug!(step = index, %label, "snap");
                let snapshot = driver.capture_snapshot().await?;
                captures.push(Capture {
                    label: label.clone(),
                    frame: snapshot.frame,
                    image: snapshot.image,
                });
            }
        }
    }

    // The per-step checks cannot see latency incurred by the final step's
    // driver call, so the budget is checked once more before returning.
    check_budget(&options, start_ms, budget_ms, protocol.len() - 1)?;

    let frame_count = driver.read_frame_count().await?;
    tracing::debug!(frame_count, captures = captures.len(), "replay complete");
    Ok(ExecutionResult {
        frame_count,
        captures,
    })
}

fn check_budget<C: Clock>(
    options: &ExecOptions<C>,
    start_ms: u64,
    budget_ms: u64,
    step: usize,
) -> ExecResult<()> {
    let elapsed = options.clock.now_ms().saturating_sub(start_ms);
    if elapsed > budget_ms {
        tracing::warn!(step, elapsed_ms = elapsed, budget_ms, "runtime budget exceeded");
        return Err(BudgetError {
            step,
            budget_seconds: options.max_run_seconds,
        }
        .into());
    }
    Ok(())
}

//! Script grammar for headless game test runs.
//!
//! A script is an ordered, bounded sequence of steps: advance the host
//! simulation, inject a synthetic pointer event, or capture a labelled
//! snapshot. The typed model here is only ever produced by the validating
//! parser in [`parser`], so every [`Protocol`] in circulation already
//! satisfies the grammar and the compiled-in resource ceilings.

/// Validating parser turning raw JSON values into [`Protocol`]s.
pub mod parser;

use serde::Serialize;

/// Maximum number of steps a single script may contain.
pub const MAX_STEPS: usize = 64;

/// Maximum number of input steps a single script may contain.
pub const MAX_INPUT_EVENTS: usize = 128;

/// Wall-clock ceiling, in seconds, within which an entire script must
/// finish executing.
pub const MAX_RUN_SECONDS: u64 = 20;

/// Per-run resource ceilings enforced by the parser.
///
/// These bound what an accepted script may ask of the host: the cumulative
/// simulated-frame total across all `run` steps and the number of snapshot
/// captures. The defaults match the reference configuration; callers may
/// override them per [`parser::ScriptParser`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Ceiling on the sum of all `run` frame counts in one script.
    pub max_frames: u64,
    /// Ceiling on the number of `snap` steps in one script.
    pub max_snaps: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frames: 120,
            max_snaps: 1,
        }
    }
}

/// Pointer action carried by an input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerAction {
    /// Pointer pressed.
    Down,
    /// Pointer moved while tracked.
    Move,
    /// Pointer released.
    Up,
    /// Pointer sequence aborted by the platform.
    Cancel,
}

/// Coordinate space an input step's position is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSpace {
    /// Both axes range over `[0, 1]` and are scaled by the viewport size.
    Norm01,
    /// Absolute client pixels, bounded by the viewport size.
    Pixels,
}

/// Which synthetic event family the host should deliver for an input step.
///
/// `Both` is forwarded to the driver verbatim as a single logical event;
/// it is never split into separate touch and mouse deliveries by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Deliver as a touch event.
    Touch,
    /// Deliver as a mouse event.
    Mouse,
    /// Deliver as both families in one logical event.
    Both,
}

/// One validated synthetic pointer input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputStep {
    /// Pointer action to inject.
    pub action: PointerAction,
    /// Pointer identifier, forwarded to the host unchanged.
    pub pointer_id: i64,
    /// Horizontal position in `space` coordinates.
    pub x: f64,
    /// Vertical position in `space` coordinates.
    pub y: f64,
    /// Coordinate space `x`/`y` are declared in (default `norm01`).
    pub space: CoordSpace,
    /// Event family the host should emit (default `both`).
    pub emit: EmitMode,
}

/// One validated script step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Advance the host simulation by a positive number of discrete frames.
    Run {
        /// Frame count, `>= 1`; the script-wide sum is capped by
        /// [`Limits::max_frames`].
        frames: u32,
    },
    /// Inject one synthetic pointer event.
    Input(InputStep),
    /// Capture a still image tagged with a label.
    Snap {
        /// Non-empty, pre-trimmed capture label.
        label: String,
    },
}

/// A validated, ordered, bounded sequence of steps describing one test run.
///
/// Produced once per script by [`parser::ScriptParser::parse`] and consumed
/// exactly once by [`crate::execute`]. Immutable after construction:
/// `1 <= len <= MAX_STEPS` always holds and there is no mutation API.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    steps: Vec<Step>,
}

impl Protocol {
    /// Crate-internal constructor; callers go through the parser, which is
    /// the only place the grammar and limits are enforced.
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        debug_assert!(!steps.is_empty() && steps.len() <= MAX_STEPS);
        Self { steps }
    }

    /// Number of steps in the script.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: the parser rejects empty step lists.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The validated steps in script order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Sum of all `run` frame counts in the script.
    pub fn total_frames(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Run { frames } => u64::from(*frames),
                _ => 0,
            })
            .sum()
    }

    /// Number of input steps in the script.
    pub fn input_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Input(_)))
            .count()
    }

    /// Number of snapshot steps in the script.
    pub fn snap_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Snap { .. }))
            .count()
    }
}

use serde_json::json;

use playcheck::{
    Capture, Driver, DriverCall, EmitMode, ExecError, ExecOptions, ManualClock, PointerAction,
    PointerEvent, SimDriver, SimOp, Snapshot, execute, parse,
};
use playcheck::error::DriverResult;

/// Simulated driver that also burns manual-clock time on every frame
/// advance, for exercising the budget checks deterministically.
struct SlowDriver {
    inner: SimDriver,
    clock: ManualClock,
    run_cost_ms: u64,
}

impl Driver for SlowDriver {
    async fn run_frames(&mut self, frames: u32) -> DriverResult<()> {
        self.clock.advance(self.run_cost_ms);
        self.inner.run_frames(frames).await
    }

    async fn apply_input(&mut self, event: PointerEvent) -> DriverResult<()> {
        self.inner.apply_input(event).await
    }

    async fn capture_snapshot(&mut self) -> DriverResult<Snapshot> {
        self.inner.capture_snapshot().await
    }

    async fn read_frame_count(&mut self) -> DriverResult<u64> {
        self.inner.read_frame_count().await
    }
}

fn reference_script() -> serde_json::Value {
    json!({ "steps": [
        { "run": 5 },
        { "input": { "action": "down", "pointerId": 2, "x": 0.5, "y": 0.25,
                     "space": "norm01", "emit": "touch" } },
        { "run": 4 },
        { "snap": "after-input" }
    ] })
}

#[tokio::test]
async fn replays_steps_in_script_order() {
    let protocol = parse(&reference_script()).expect("parse");
    let mut driver = SimDriver::new();

    let result = execute(&protocol, &mut driver, ExecOptions::default())
        .await
        .expect("replay");

    let expected_event = PointerEvent {
        action: PointerAction::Down,
        pointer_id: 2,
        client_x: 180.0,
        client_y: 160.0,
        source: EmitMode::Touch,
    };
    assert_eq!(
        driver.calls(),
        &[
            DriverCall::RunFrames { frames: 5 },
            DriverCall::ApplyInput {
                event: expected_event
            },
            DriverCall::RunFrames { frames: 4 },
            DriverCall::CaptureSnapshot,
            DriverCall::ReadFrameCount,
        ]
    );

    assert_eq!(result.frame_count, 9);
    assert_eq!(result.captures.len(), 1);
    let Capture { label, frame, image } = &result.captures[0];
    assert_eq!(label, "after-input");
    assert_eq!(*frame, 9, "capture frame comes from the host, post run(4)");
    assert!(!image.is_empty());
}

#[tokio::test]
async fn emit_both_reaches_the_driver_as_one_event() {
    let raw = json!({ "steps": [
        { "input": { "action": "up", "pointerId": 1, "x": 1.0, "y": 1.0, "emit": "both" } }
    ] });
    let protocol = parse(&raw).expect("parse");
    let mut driver = SimDriver::new();

    execute(&protocol, &mut driver, ExecOptions::default())
        .await
        .expect("replay");

    let inputs: Vec<&DriverCall> = driver
        .calls()
        .iter()
        .filter(|call| matches!(call, DriverCall::ApplyInput { .. }))
        .collect();
    assert_eq!(inputs.len(), 1, "both must not be split into two deliveries");
    match inputs[0] {
        DriverCall::ApplyInput { event } => assert_eq!(event.source, EmitMode::Both),
        other => panic!("expected input call, got {other:?}"),
    }
}

#[tokio::test]
async fn pixel_input_passes_through_unscaled() {
    let raw = json!({ "steps": [
        { "input": { "action": "move", "pointerId": 0, "x": 12.0, "y": 599.5,
                     "space": "pixels" } }
    ] });
    let protocol = parse(&raw).expect("parse");
    let mut driver = SimDriver::new();

    execute(&protocol, &mut driver, ExecOptions::default())
        .await
        .expect("replay");

    match &driver.calls()[0] {
        DriverCall::ApplyInput { event } => {
            assert_eq!(event.client_x, 12.0);
            assert_eq!(event.client_y, 599.5);
        }
        other => panic!("expected input call, got {other:?}"),
    }
}

#[tokio::test]
async fn exhausted_budget_rejects_before_the_first_step() {
    let protocol = parse(&reference_script()).expect("parse");
    let clock = ManualClock::new();
    clock.advance(21_000);

    let mut driver = SimDriver::new();
    let err = execute(&protocol, &mut driver, ExecOptions::with_clock(clock))
        .await
        .expect_err("budget must trip");

    match err {
        ExecError::Budget(budget) => {
            assert_eq!(budget.step, 0);
            assert_eq!(budget.budget_seconds, 20);
            assert_eq!(
                budget.to_string(),
                "runtime budget of 20s exceeded at step 0"
            );
        }
        other => panic!("expected budget error, got {other:?}"),
    }
    assert!(driver.calls().is_empty(), "no driver call may start");
}

#[tokio::test]
async fn budget_trips_mid_script_naming_the_next_step() {
    // Five run steps at 6 simulated seconds each: the check before step 4
    // sees 24s elapsed against a 20s budget.
    let raw = json!({ "steps": [
        { "run": 1 }, { "run": 1 }, { "run": 1 }, { "run": 1 }, { "run": 1 }
    ] });
    let protocol = parse(&raw).expect("parse");
    let clock = ManualClock::new();
    let mut driver = SlowDriver {
        inner: SimDriver::new(),
        clock: clock.clone(),
        run_cost_ms: 6_000,
    };

    let err = execute(&protocol, &mut driver, ExecOptions::with_clock(clock))
        .await
        .expect_err("budget must trip");

    match err {
        ExecError::Budget(budget) => assert_eq!(budget.step, 4),
        other => panic!("expected budget error, got {other:?}"),
    }
    // Steps already applied to the driver stay applied.
    assert_eq!(driver.inner.calls().len(), 4);
    assert_eq!(driver.inner.frame(), 4);
}

#[tokio::test]
async fn trailing_check_catches_overrun_during_the_last_step() {
    // A single run step that itself blows the budget: every pre-step check
    // passes, so only the final check can report it.
    let raw = json!({ "steps": [ { "run": 1 } ] });
    let protocol = parse(&raw).expect("parse");
    let clock = ManualClock::new();
    let mut driver = SlowDriver {
        inner: SimDriver::new(),
        clock: clock.clone(),
        run_cost_ms: 25_000,
    };

    let err = execute(&protocol, &mut driver, ExecOptions::with_clock(clock))
        .await
        .expect_err("budget must trip");

    match err {
        ExecError::Budget(budget) => assert_eq!(budget.step, 0),
        other => panic!("expected budget error, got {other:?}"),
    }
}

#[tokio::test]
async fn driver_failure_aborts_the_remaining_steps() {
    let protocol = parse(&reference_script()).expect("parse");
    let mut driver = SimDriver::new().failing_on(SimOp::CaptureSnapshot);

    let err = execute(&protocol, &mut driver, ExecOptions::default())
        .await
        .expect_err("capture failure must abort");

    match err {
        ExecError::Driver(driver_err) => {
            assert_eq!(driver_err.operation, "captureSnapshot");
        }
        other => panic!("expected driver error, got {other:?}"),
    }
    // The three steps before the failing snap were applied and stay applied.
    assert_eq!(driver.calls().len(), 3);
    assert_eq!(driver.frame(), 9);
}

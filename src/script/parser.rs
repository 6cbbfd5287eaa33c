//! Validating parser for raw test scripts.
//!
//! Raw scripts arrive as untyped [`serde_json::Value`]s. Parsing is
//! all-or-nothing: either the whole script satisfies the grammar and the
//! resource ceilings and a [`Protocol`] is returned, or a
//! [`ValidationError`] names the offending field path and nothing is
//! accepted. The parser never mutates its input, so parsing the same value
//! twice yields structurally equal protocols.

use serde_json::Value;
use std::path::Path;

use crate::error::{ParseResult, ValidationError};
use crate::script::{
    CoordSpace, EmitMode, InputStep, Limits, MAX_INPUT_EVENTS, MAX_STEPS, PointerAction, Protocol,
    Step,
};
use crate::viewport::Viewport;

/// Parse a raw script with the default [`Limits`] and [`Viewport`].
pub fn parse(raw: &Value) -> ParseResult<Protocol> {
    ScriptParser::new().parse(raw)
}

/// Cumulative resource counters for one parse.
///
/// Created fresh per [`ScriptParser::parse`] call and threaded explicitly
/// through each step, never held as shared state, so concurrent parses
/// cannot interfere.
#[derive(Debug, Default)]
struct ParserState {
    total_frames: u64,
    input_count: usize,
    snap_count: usize,
}

/// Script validator bound to a set of limits and a viewport.
///
/// The viewport is only consulted to bound pixel-space input positions;
/// normalized positions are checked against `[0, 1]` regardless of it.
#[derive(Debug, Clone)]
pub struct ScriptParser {
    limits: Limits,
    viewport: Viewport,
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptParser {
    /// Create a parser with the reference limits and viewport.
    pub fn new() -> Self {
        Self::with_config(Limits::default(), Viewport::default())
    }

    /// Create a parser with explicit limits and viewport.
    pub fn with_config(limits: Limits, viewport: Viewport) -> Self {
        Self { limits, viewport }
    }

    /// Validate a raw script into a [`Protocol`].
    pub fn parse(&self, raw: &Value) -> ParseResult<Protocol> {
        let root = raw
            .as_object()
            .ok_or_else(|| ValidationError::new("script", "top level must be an object"))?;

        for key in root.keys() {
            if key != "steps" {
                return Err(ValidationError::new(
                    key.clone(),
                    "unrecognized top-level key",
                ));
            }
        }

        let steps_value = root.get("steps").ok_or_else(|| {
            ValidationError::new("steps", format!("must be an array of 1 to {MAX_STEPS} steps"))
        })?;
        let raw_steps = steps_value.as_array().ok_or_else(|| {
            ValidationError::new("steps", format!("must be an array of 1 to {MAX_STEPS} steps"))
        })?;
        if raw_steps.is_empty() || raw_steps.len() > MAX_STEPS {
            return Err(ValidationError::new(
                "steps",
                format!(
                    "must contain between 1 and {MAX_STEPS} steps, got {}",
                    raw_steps.len()
                ),
            ));
        }

        let mut state = ParserState::default();
        let mut steps = Vec::with_capacity(raw_steps.len());
        for (index, raw_step) in raw_steps.iter().enumerate() {
            steps.push(self.parse_step(index, raw_step, &mut state)?);
        }

        tracing::debug!(
            steps = steps.len(),
            total_frames = state.total_frames,
            inputs = state.input_count,
            snaps = state.snap_count,
            "script accepted"
        );
        Ok(Protocol::new(steps))
    }

    /// Read a script from a JSON file and validate it.
    ///
    /// Convenience for file-based adapters; IO and JSON failures are
    /// reported as validation errors at the file's path.
    pub fn parse_file(&self, path: &Path) -> ParseResult<Protocol> {
        let file_path = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ValidationError::new(file_path.as_str(), format!("unable to read script: {err}")))?;
        let raw: Value = serde_json::from_str(&text)
            .map_err(|err| ValidationError::new(file_path.as_str(), format!("script is not valid JSON: {err}")))?;
        self.parse(&raw)
    }

    fn parse_step(
        &self,
        index: usize,
        raw: &Value,
        state: &mut ParserState,
    ) -> ParseResult<Step> {
        let path = format!("steps[{index}]");
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationError::new(&path, "step must be an object"))?;

        let mut variants = 0usize;
        for key in object.keys() {
            match key.as_str() {
                "run" | "input" | "snap" => variants += 1,
                other => {
                    return Err(ValidationError::new(
                        format!("{path}.{other}"),
                        "unrecognized step key",
                    ));
                }
            }
        }
        if variants != 1 {
            return Err(ValidationError::new(
                &path,
                "step must contain exactly one of run, input, snap",
            ));
        }

        if let Some(value) = object.get("run") {
            self.parse_run(&path, value, state)
        } else if let Some(value) = object.get("input") {
            self.parse_input(&path, value, state)
        } else {
            // `variants == 1` guarantees `snap` is present here.
            self.parse_snap(&path, &object["snap"], state)
        }
    }

    fn parse_run(&self, path: &str, raw: &Value, state: &mut ParserState) -> ParseResult<Step> {
        let path = format!("{path}.run");
        let frames = raw
            .as_u64()
            .filter(|frames| *frames >= 1)
            .ok_or_else(|| ValidationError::new(&path, "must be a positive integer"))?;

        // Saturate so an absurd frame count cannot wrap the counter; the
        // limit check below rejects anything past the budget either way.
        state.total_frames = state.total_frames.saturating_add(frames);
        if state.total_frames > self.limits.max_frames {
            return Err(ValidationError::new(
                &path,
                format!(
                    "cumulative run total of {} frames exceeds the limit of {}",
                    state.total_frames, self.limits.max_frames
                ),
            ));
        }

        let frames = u32::try_from(frames)
            .map_err(|_| ValidationError::new(&path, "frame count out of range"))?;
        Ok(Step::Run { frames })
    }

    fn parse_input(&self, path: &str, raw: &Value, state: &mut ParserState) -> ParseResult<Step> {
        let path = format!("{path}.input");
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationError::new(&path, "input must be an object"))?;

        state.input_count += 1;
        if state.input_count > MAX_INPUT_EVENTS {
            return Err(ValidationError::new(
                &path,
                format!("script exceeds the limit of {MAX_INPUT_EVENTS} input events"),
            ));
        }

        for key in object.keys() {
            match key.as_str() {
                "action" | "pointerId" | "x" | "y" | "space" | "emit" => {}
                other => {
                    return Err(ValidationError::new(
                        format!("{path}.{other}"),
                        "unrecognized input key",
                    ));
                }
            }
        }

        // Stage one: apply documented defaults so the record below is fully
        // populated before any bound is checked.
        let action = self.parse_enum(
            &format!("{path}.action"),
            object.get("action"),
            &ACTION_VALUES,
        )?;
        let pointer_id = object
            .get("pointerId")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ValidationError::new(format!("{path}.pointerId"), "must be an integer")
            })?;
        let x = self.parse_coord(&format!("{path}.x"), object.get("x"))?;
        let y = self.parse_coord(&format!("{path}.y"), object.get("y"))?;
        let space = match object.get("space") {
            None => CoordSpace::Norm01,
            Some(value) => self.parse_enum(&format!("{path}.space"), Some(value), &SPACE_VALUES)?,
        };
        let emit = match object.get("emit") {
            None => EmitMode::Both,
            Some(value) => self.parse_enum(&format!("{path}.emit"), Some(value), &EMIT_VALUES)?,
        };

        // Stage two: validate the populated record, including the
        // space-dependent position bounds.
        let (max_x, max_y) = match space {
            CoordSpace::Norm01 => (1.0, 1.0),
            CoordSpace::Pixels => (self.viewport.width, self.viewport.height),
        };
        check_bound(&format!("{path}.x"), x, max_x)?;
        check_bound(&format!("{path}.y"), y, max_y)?;

        Ok(Step::Input(InputStep {
            action,
            pointer_id,
            x,
            y,
            space,
            emit,
        }))
    }

    fn parse_snap(&self, path: &str, raw: &Value, state: &mut ParserState) -> ParseResult<Step> {
        let path = format!("{path}.snap");
        let label = raw
            .as_str()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .ok_or_else(|| ValidationError::new(&path, "label must be a non-empty string"))?;

        state.snap_count += 1;
        if state.snap_count > self.limits.max_snaps {
            return Err(ValidationError::new(
                &path,
                format!(
                    "script exceeds the snapshot limit of {}",
                    self.limits.max_snaps
                ),
            ));
        }

        Ok(Step::Snap {
            label: label.to_string(),
        })
    }

    fn parse_coord(&self, path: &str, raw: Option<&Value>) -> ParseResult<f64> {
        raw.and_then(Value::as_f64)
            .filter(|value| value.is_finite())
            .ok_or_else(|| ValidationError::new(path, "must be a finite number"))
    }

    fn parse_enum<T: Copy>(
        &self,
        path: &str,
        raw: Option<&Value>,
        values: &[(&str, T)],
    ) -> ParseResult<T> {
        let text = raw
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::new(path, expected_one_of(values)))?;
        values
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, value)| *value)
            .ok_or_else(|| ValidationError::new(path, expected_one_of(values)))
    }
}

const ACTION_VALUES: [(&str, PointerAction); 4] = [
    ("down", PointerAction::Down),
    ("move", PointerAction::Move),
    ("up", PointerAction::Up),
    ("cancel", PointerAction::Cancel),
];

const SPACE_VALUES: [(&str, CoordSpace); 2] = [
    ("norm01", CoordSpace::Norm01),
    ("pixels", CoordSpace::Pixels),
];

const EMIT_VALUES: [(&str, EmitMode); 3] = [
    ("touch", EmitMode::Touch),
    ("mouse", EmitMode::Mouse),
    ("both", EmitMode::Both),
];

fn expected_one_of<T>(values: &[(&str, T)]) -> String {
    let names: Vec<&str> = values.iter().map(|(name, _)| *name).collect();
    format!("must be one of {}", names.join(", "))
}

fn check_bound(path: &str, value: f64, max: f64) -> ParseResult<()> {
    if value < 0.0 || value > max {
        return Err(ValidationError::new(
            path,
            format!("must be between 0 and {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_script() {
        let raw = json!({ "steps": [ { "run": 3 } ] });
        let protocol = parse(&raw).expect("parse");
        assert_eq!(protocol.len(), 1);
        assert_eq!(protocol.steps()[0], Step::Run { frames: 3 });
    }

    #[test]
    fn applies_input_defaults_before_validation() {
        let raw = json!({ "steps": [
            { "input": { "action": "down", "pointerId": 1, "x": 0.5, "y": 0.5 } }
        ] });
        let protocol = parse(&raw).expect("parse");
        match &protocol.steps()[0] {
            Step::Input(input) => {
                assert_eq!(input.space, CoordSpace::Norm01);
                assert_eq!(input.emit, EmitMode::Both);
            }
            other => panic!("expected input step, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let raw = json!({ "steps": [ { "run": 1 } ], "legacy": true });
        let err = parse(&raw).expect_err("must reject");
        assert_eq!(err.path, "legacy");
    }

    #[test]
    fn rejects_step_with_two_variants() {
        let raw = json!({ "steps": [ { "run": 1, "snap": "x" } ] });
        let err = parse(&raw).expect_err("must reject");
        assert_eq!(err.path, "steps[0]");
        assert!(err.reason.contains("exactly one"));
    }

    #[test]
    fn reports_negative_run_as_not_positive() {
        let raw = json!({ "steps": [ { "run": -2 } ] });
        let err = parse(&raw).expect_err("must reject");
        assert_eq!(err.path, "steps[0].run");
        assert_eq!(err.reason, "must be a positive integer");
    }

    #[test]
    fn trims_snap_labels() {
        let raw = json!({ "steps": [ { "snap": "  title  " } ] });
        let protocol = parse(&raw).expect("parse");
        assert_eq!(
            protocol.steps()[0],
            Step::Snap {
                label: "title".to_string()
            }
        );
    }
}

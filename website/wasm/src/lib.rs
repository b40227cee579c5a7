//! Browser bindings for the roundtable execution core.
//!
//! Values cross the boundary as plain JavaScript objects shaped like the backend's JSON
//! (`RoundRecord`, `PlacementRecord`). Results are serialized JSON-compatible, so `u64`
//! amounts and ids arrive as numbers.

use roundtable_execution::{
    aggregate_round, angle_matches, format_countdown as format_ms, resolve,
    wheel_target_angle as target_angle, Chip, ClockReading, Resolution, ResultGate,
    RoundClock, RuleBook, RulesError, RulesOverride,
};
use roundtable_types::{PlacementRecord, RoundRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use tracing::debug;
use wasm_bindgen::prelude::*;

/// Helper to convert a serializable value to a plain JavaScript object
fn to_object<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {e}")))
}

fn from_object<T: DeserializeOwned>(what: &str, value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {what}: {e}")))
}

fn rule_book(overrides: Option<Vec<RulesOverride>>) -> Result<RuleBook, RulesError> {
    match overrides {
        Some(overrides) => RuleBook::with_overrides(&overrides),
        None => Ok(RuleBook::default()),
    }
}

fn clock_reading(round: &RoundRecord, now_ms: u64) -> ClockReading {
    RoundClock::at(round, now_ms)
}

fn chips(round: &RoundRecord, placements: &[PlacementRecord]) -> Vec<Chip> {
    aggregate_round(round, placements)
}

fn resolution(
    round: &RoundRecord,
    placements: &[PlacementRecord],
    overrides: Option<Vec<RulesOverride>>,
) -> Result<Resolution, RulesError> {
    let book = rule_book(overrides)?;
    Ok(resolve(round, placements, book.get(round.game_type)))
}

#[derive(Serialize)]
struct ClockView {
    #[serde(flatten)]
    reading: ClockReading,
    place_time_left: String,
    game_time_left: String,
}

/// Phase and countdowns of `round` at `now_ms`.
#[wasm_bindgen]
pub fn round_clock(round: JsValue, now_ms: u64) -> Result<JsValue, JsValue> {
    let round: RoundRecord = from_object("round", round)?;
    let reading = clock_reading(&round, now_ms);
    to_object(&ClockView {
        reading,
        place_time_left: reading.place_time_left(),
        game_time_left: reading.game_time_left(),
    })
}

/// Format a millisecond countdown as `mm:ss`.
#[wasm_bindgen]
pub fn format_countdown(ms: u64) -> String {
    format_ms(ms)
}

/// Board chips for the user's placements on `round`.
#[wasm_bindgen]
pub fn aggregate_chips(round: JsValue, placements: JsValue) -> Result<JsValue, JsValue> {
    let round: RoundRecord = from_object("round", round)?;
    let placements: Vec<PlacementRecord> = from_object("placements", placements)?;
    to_object(&chips(&round, &placements))
}

/// Resolve the round for the user's placements. `rules` is an optional array of overrides.
#[wasm_bindgen]
pub fn resolve_outcome(
    round: JsValue,
    placements: JsValue,
    rules: JsValue,
) -> Result<JsValue, JsValue> {
    let round: RoundRecord = from_object("round", round)?;
    let placements: Vec<PlacementRecord> = from_object("placements", placements)?;
    let overrides: Option<Vec<RulesOverride>> = from_object("rules", rules)?;
    let resolution = resolution(&round, &placements, overrides)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_object(&resolution)
}

/// Angle the wheel must stop at for segment `index` of `count`.
#[wasm_bindgen]
pub fn wheel_target_angle(index: usize, count: usize) -> Option<f64> {
    target_angle(index, count)
}

/// Whether the wheel at `current` degrees shows the target segment.
#[wasm_bindgen]
pub fn wheel_angle_matches(current: f64, target: f64, tolerance: f64) -> bool {
    angle_matches(current, target, tolerance)
}

/// Result dialog gate for one game screen.
#[wasm_bindgen]
pub struct ResultDialog {
    gate: ResultGate,
}

impl Default for ResultDialog {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ResultDialog {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ResultDialog {
        ResultDialog {
            gate: ResultGate::new(),
        }
    }

    /// Feed the latest round record and clock time.
    #[wasm_bindgen]
    pub fn observe(&mut self, round: JsValue, now_ms: u64, placement_count: usize) -> Result<(), JsValue> {
        let round: RoundRecord = from_object("round", round)?;
        self.observe_round(&round, now_ms, placement_count);
        Ok(())
    }

    /// Offer the round's outcome. Returns whether the dialog should open; an open dialog
    /// for the same round takes the newer figures.
    #[wasm_bindgen]
    pub fn offer(&mut self, round: JsValue, placements: JsValue, rules: JsValue) -> Result<bool, JsValue> {
        let round: RoundRecord = from_object("round", round)?;
        let placements: Vec<PlacementRecord> = from_object("placements", placements)?;
        let overrides: Option<Vec<RulesOverride>> = from_object("rules", rules)?;
        let resolution = resolution(&round, &placements, overrides)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(self.offer_resolution(&resolution))
    }

    #[wasm_bindgen]
    pub fn dismiss(&mut self) {
        self.gate.dismiss();
    }

    /// Current gate state as `{state, round_id?, resolution?}`.
    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_object(self.gate.state())
    }
}

impl ResultDialog {
    fn offer_resolution(&mut self, resolution: &Resolution) -> bool {
        if self.gate.outcome_available(resolution) {
            return true;
        }
        self.gate.refresh(resolution);
        false
    }

    fn observe_round(&mut self, round: &RoundRecord, now_ms: u64, placement_count: usize) {
        self.gate.round_superseded(round.id);
        let phase = RoundClock::phase_at(round, now_ms);
        debug!(round_id = round.id, phase = phase.as_str(), "observe");
        self.gate.observe(round.id, phase, placement_count);
    }
}

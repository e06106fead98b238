use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_TRANSITION_BLEND: f32 = 0.3;

/// Guard evaluated against the state machine's parameters. Missing parameters read as false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Condition {
    Bool { name: String },
    IntEquals { name: String, value: i32 },
    FloatAbove { name: String, threshold: f32 },
    FloatBelow { name: String, threshold: f32 },
    /// Like `Bool`, but the parameter is reset to false when the guarded transition fires.
    Trigger { name: String },
}

impl Condition {
    pub fn bool(name: impl Into<String>) -> Self {
        Condition::Bool { name: name.into() }
    }

    pub fn trigger(name: impl Into<String>) -> Self {
        Condition::Trigger { name: name.into() }
    }

    pub fn parameter(&self) -> &str {
        match self {
            Condition::Bool { name }
            | Condition::IntEquals { name, .. }
            | Condition::FloatAbove { name, .. }
            | Condition::FloatBelow { name, .. }
            | Condition::Trigger { name } => name,
        }
    }
}

/// Edge between two states. Every condition must hold for it to fire; an empty list always holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_blend_time")]
    pub blend_time: f32,
    #[serde(default)]
    pub exit_time: Option<f32>,
}

fn default_blend_time() -> f32 {
    DEFAULT_TRANSITION_BLEND
}

impl Transition {
    pub fn new(from: impl Into<String>, to: impl Into<String>, condition_param: impl Into<String>) -> Self {
        Self::when(from, to, Condition::bool(condition_param))
    }

    pub fn when(from: impl Into<String>, to: impl Into<String>, condition: Condition) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            conditions: vec![condition],
            blend_time: DEFAULT_TRANSITION_BLEND,
            exit_time: None,
        }
    }

    pub fn after(from: impl Into<String>, to: impl Into<String>, seconds: f32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            conditions: Vec::new(),
            blend_time: DEFAULT_TRANSITION_BLEND,
            exit_time: Some(seconds.max(0.0)),
        }
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_blend_time(mut self, blend_time: f32) -> Self {
        self.blend_time = blend_time.max(0.0);
        self
    }

    pub fn with_exit_time(mut self, seconds: f32) -> Self {
        self.exit_time = Some(seconds.max(0.0));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StateChange {
    pub from: String,
    pub to: String,
    pub blend_time: f32,
}

/// Named states mapped to clips, switched by parameter-driven transitions.
///
/// Transitions are scanned in registration order and the first match wins. At most one transition fires
/// per [`AnimationStateMachine::update`].
#[derive(Clone, Debug, Default)]
pub struct AnimationStateMachine {
    initial_state: Option<String>,
    current_state: Option<String>,
    time_in_state: f32,
    state_to_clip: HashMap<String, String>,
    transitions: Vec<Transition>,
    bool_parameters: HashMap<String, bool>,
    int_parameters: HashMap<String, i32>,
    float_parameters: HashMap<String, f32>,
}

impl AnimationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, name: impl Into<String>, clip_name: impl Into<String>) {
        let name = name.into();
        if self.current_state.is_none() {
            self.current_state = Some(name.clone());
            self.initial_state = Some(name.clone());
        }
        self.state_to_clip.insert(name, clip_name.into());
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) {
        self.bool_parameters.insert(name.into(), value);
    }

    pub fn set_int(&mut self, name: impl Into<String>, value: i32) {
        self.int_parameters.insert(name.into(), value);
    }

    pub fn set_float(&mut self, name: impl Into<String>, value: f32) {
        self.float_parameters.insert(name.into(), value);
    }

    pub fn set_trigger(&mut self, name: impl Into<String>) {
        self.set_bool(name, true);
    }

    pub fn bool_parameter(&self, name: &str) -> Option<bool> {
        self.bool_parameters.get(name).copied()
    }

    pub fn int_parameter(&self, name: &str) -> Option<i32> {
        self.int_parameters.get(name).copied()
    }

    pub fn float_parameter(&self, name: &str) -> Option<f32> {
        self.float_parameters.get(name).copied()
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn target_clip(&self) -> Option<&str> {
        self.current_state.as_deref().and_then(|state| self.state_clip(state))
    }

    pub fn state_clip(&self, state: &str) -> Option<&str> {
        self.state_to_clip.get(state).map(String::as_str)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn reset(&mut self) {
        self.current_state = self.initial_state.clone();
        self.time_in_state = 0.0;
    }

    pub fn update(&mut self, delta: f32) -> Option<StateChange> {
        if delta.is_finite() && delta > 0.0 {
            self.time_in_state += delta;
        }
        let current = self.current_state.as_deref()?;
        let index = self.transitions.iter().position(|transition| {
            transition.from == current
                && transition.exit_time.map_or(true, |exit| self.time_in_state >= exit)
                && transition.conditions.iter().all(|condition| self.evaluate(condition))
        })?;

        let transition = &self.transitions[index];
        if !self.state_to_clip.contains_key(&transition.to) {
            log::warn!(
                "transition '{}' -> '{}' targets a state with no clip; target clip will be empty",
                transition.from,
                transition.to
            );
        }
        let change = StateChange {
            from: transition.from.clone(),
            to: transition.to.clone(),
            blend_time: transition.blend_time,
        };
        let consumed: Vec<String> = transition
            .conditions
            .iter()
            .filter_map(|condition| match condition {
                Condition::Trigger { name } => Some(name.clone()),
                _ => None,
            })
            .collect();
        for name in consumed {
            self.bool_parameters.insert(name, false);
        }
        self.current_state = Some(change.to.clone());
        self.time_in_state = 0.0;
        Some(change)
    }

    fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Bool { name } | Condition::Trigger { name } => {
                self.bool_parameters.get(name).copied().unwrap_or(false)
            }
            Condition::IntEquals { name, value } => self.int_parameters.get(name) == Some(value),
            Condition::FloatAbove { name, threshold } => {
                self.float_parameters.get(name).is_some_and(|value| *value > *threshold)
            }
            Condition::FloatBelow { name, threshold } => {
                self.float_parameters.get(name).is_some_and(|value| *value < *threshold)
            }
        }
    }
}

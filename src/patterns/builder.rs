use super::{Condition, PatternAutomaton, State, StateType, Transition};
use crate::error::AnalysisError;
use crate::score::Severity;

/// Assembles and validates a [`PatternAutomaton`].
///
/// `build` enforces the automaton invariants: exactly one start state, every
/// transition target resolves, accept and fail states carry no outgoing
/// transitions, and the weight sits in 1..=100. Violations are reported as
/// `InvalidInput` so malformed pattern definitions never reach the engine.
pub struct AutomatonBuilder {
    pattern_id: String,
    name: String,
    description: String,
    weight: u32,
    severity: Severity,
    states: Vec<State>,
    errors: Vec<String>,
}

impl AutomatonBuilder {
    pub fn new(pattern_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pattern_id: pattern_id.into(),
            name: name.into(),
            description: String::new(),
            weight: 1,
            severity: Severity::Low,
            states: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn start(self, id: impl Into<String>) -> Self {
        self.add_state(id.into(), StateType::Start)
    }

    pub fn state(self, id: impl Into<String>) -> Self {
        self.add_state(id.into(), StateType::Normal)
    }

    pub fn accept(self, id: impl Into<String>) -> Self {
        self.add_state(id.into(), StateType::Accept)
    }

    pub fn fail(self, id: impl Into<String>) -> Self {
        self.add_state(id.into(), StateType::Fail)
    }

    pub fn transition(
        mut self,
        from: impl AsRef<str>,
        to: impl Into<String>,
        conditions: Vec<Condition>,
    ) -> Self {
        let from = from.as_ref();
        match self.states.iter_mut().find(|s| s.id == from) {
            Some(state) => state.transitions.push(Transition {
                target: to.into(),
                conditions,
            }),
            None => self
                .errors
                .push(format!("transition from undefined state '{from}'")),
        }
        self
    }

    pub fn build(self) -> Result<PatternAutomaton, AnalysisError> {
        let invalid = |msg: String| {
            AnalysisError::InvalidInput(format!("automaton '{}': {msg}", self.pattern_id))
        };

        if let Some(err) = self.errors.first() {
            return Err(invalid(err.clone()));
        }
        if !(1..=100).contains(&self.weight) {
            return Err(invalid(format!("weight {} outside 1..=100", self.weight)));
        }

        let starts: Vec<&State> = self
            .states
            .iter()
            .filter(|s| s.state_type == StateType::Start)
            .collect();
        if starts.len() != 1 {
            return Err(invalid(format!("{} start states, expected 1", starts.len())));
        }
        let initial_state = starts[0].id.clone();

        for state in &self.states {
            if self.states.iter().filter(|s| s.id == state.id).count() > 1 {
                return Err(invalid(format!("duplicate state id '{}'", state.id)));
            }
            let terminal = matches!(state.state_type, StateType::Accept | StateType::Fail);
            if terminal && !state.transitions.is_empty() {
                return Err(invalid(format!(
                    "terminal state '{}' has outgoing transitions",
                    state.id
                )));
            }
            for transition in &state.transitions {
                if !self.states.iter().any(|s| s.id == transition.target) {
                    return Err(invalid(format!(
                        "transition from '{}' targets undefined state '{}'",
                        state.id, transition.target
                    )));
                }
            }
        }

        Ok(PatternAutomaton {
            pattern_id: self.pattern_id,
            name: self.name,
            description: self.description,
            initial_state,
            states: self.states,
            weight: self.weight,
            severity: self.severity,
        })
    }

    fn add_state(mut self, id: String, state_type: StateType) -> Self {
        self.states.push(State {
            id,
            state_type,
            transitions: Vec::new(),
        });
        self
    }
}

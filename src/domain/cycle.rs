//! Cycle mode, phase and the controller's owned state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::StateMachine;

/// Whether captures are chained automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleMode {
    /// Capture, display, count green down, capture again.
    Auto,
    /// Capture only on explicit request.
    #[default]
    Manual,
}

impl CycleMode {
    pub fn is_auto(&self) -> bool {
        matches!(self, CycleMode::Auto)
    }

    pub fn toggled(&self) -> Self {
        match self {
            CycleMode::Auto => CycleMode::Manual,
            CycleMode::Manual => CycleMode::Auto,
        }
    }
}

impl fmt::Display for CycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleMode::Auto => f.write_str("auto"),
            CycleMode::Manual => f.write_str("manual"),
        }
    }
}

impl FromStr for CycleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(CycleMode::Auto),
            "manual" => Ok(CycleMode::Manual),
            other => Err(format!("unknown cycle mode '{}'", other)),
        }
    }
}

/// Observable phase of the cycle.
///
/// Derived from [`CycleState`]: an in-flight request wins over an armed
/// countdown, so a manual capture during a countdown reads as `Capturing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Capturing,
    CountingDown,
}

impl StateMachine for CyclePhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CyclePhase::*;
        matches!(
            (self, target),
            (Idle, Capturing)
                | (Capturing, Idle)
                | (Capturing, CountingDown)
                | (CountingDown, Capturing)
                | (CountingDown, Idle)
                // published detection picked up by the poller
                | (Idle, CountingDown)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CyclePhase::*;
        match self {
            Idle => vec![Capturing, CountingDown],
            Capturing => vec![Idle, CountingDown],
            CountingDown => vec![Capturing, Idle],
        }
    }
}

/// State owned by the cycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleState {
    mode: CycleMode,
    capturing: bool,
    green_remaining: u32,
    countdown_armed: bool,
}

impl CycleState {
    pub fn new(mode: CycleMode) -> Self {
        Self {
            mode,
            capturing: false,
            green_remaining: 0,
            countdown_armed: false,
        }
    }

    pub fn mode(&self) -> CycleMode {
        self.mode
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn green_remaining(&self) -> u32 {
        self.green_remaining
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown_armed
    }

    pub fn phase(&self) -> CyclePhase {
        if self.capturing {
            CyclePhase::Capturing
        } else if self.countdown_armed {
            CyclePhase::CountingDown
        } else {
            CyclePhase::Idle
        }
    }

    /// Claims the single in-flight slot. Returns false if already taken.
    pub(crate) fn begin_capture(&mut self) -> bool {
        if self.capturing {
            return false;
        }
        self.capturing = true;
        true
    }

    pub(crate) fn end_capture(&mut self) {
        self.capturing = false;
    }

    pub(crate) fn set_mode(&mut self, mode: CycleMode) {
        self.mode = mode;
    }

    pub(crate) fn arm_countdown(&mut self, seconds: u32) {
        self.green_remaining = seconds;
        self.countdown_armed = seconds > 0;
    }

    pub(crate) fn disarm_countdown(&mut self) {
        self.green_remaining = 0;
        self.countdown_armed = false;
    }

    /// One countdown tick. Returns the remaining seconds, clamped at zero.
    pub(crate) fn tick(&mut self) -> u32 {
        self.green_remaining = self.green_remaining.saturating_sub(1);
        if self.green_remaining == 0 {
            self.countdown_armed = false;
        }
        self.green_remaining
    }

    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            mode: self.mode,
            phase: self.phase(),
            capturing: self.capturing,
            green_remaining: self.green_remaining,
        }
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::new(CycleMode::default())
    }
}

/// Point-in-time copy of the cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleSnapshot {
    pub mode: CycleMode,
    pub phase: CyclePhase,
    pub capturing: bool,
    pub green_remaining: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle() {
        let state = CycleState::new(CycleMode::Auto);
        assert_eq!(state.phase(), CyclePhase::Idle);
        assert!(!state.is_capturing());
        assert_eq!(state.green_remaining(), 0);
    }

    #[test]
    fn begin_capture_is_single_flight() {
        let mut state = CycleState::default();
        assert!(state.begin_capture());
        assert!(!state.begin_capture());
        state.end_capture();
        assert!(state.begin_capture());
    }

    #[test]
    fn capturing_wins_over_countdown() {
        let mut state = CycleState::new(CycleMode::Auto);
        state.arm_countdown(10);
        assert_eq!(state.phase(), CyclePhase::CountingDown);
        state.begin_capture();
        assert_eq!(state.phase(), CyclePhase::Capturing);
        state.end_capture();
        assert_eq!(state.phase(), CyclePhase::CountingDown);
    }

    #[test]
    fn tick_clamps_at_zero_and_disarms() {
        let mut state = CycleState::new(CycleMode::Auto);
        state.arm_countdown(2);
        assert_eq!(state.tick(), 1);
        assert_eq!(state.tick(), 0);
        assert!(!state.is_counting_down());
        assert_eq!(state.tick(), 0);
    }

    #[test]
    fn arming_zero_seconds_does_not_count_down() {
        let mut state = CycleState::new(CycleMode::Auto);
        state.arm_countdown(0);
        assert_eq!(state.phase(), CyclePhase::Idle);
    }

    #[test]
    fn phase_table_matches_valid_transitions() {
        for phase in [CyclePhase::Idle, CyclePhase::Capturing, CyclePhase::CountingDown] {
            for target in phase.valid_transitions() {
                assert!(phase.can_transition_to(&target));
            }
            assert!(!phase.can_transition_to(&phase));
        }
    }

    #[test]
    fn mode_parses_and_toggles() {
        assert_eq!("AUTO".parse::<CycleMode>(), Ok(CycleMode::Auto));
        assert_eq!(" manual ".parse::<CycleMode>(), Ok(CycleMode::Manual));
        assert!("sometimes".parse::<CycleMode>().is_err());
        assert_eq!(CycleMode::Auto.toggled(), CycleMode::Manual);
    }
}

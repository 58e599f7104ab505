//! Station Lifecycle State Machine
//!
//! Defines valid lifecycle transitions for the station: boot, the repeating
//! measurement cycle, and the terminal disabled state.

/// Lifecycle states of the station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    /// Connecting transports and initialising sensors
    Booting,
    /// Idle between cycles
    Ready,
    /// Measuring and dispatching
    CycleRunning,
    /// Sensors could not be initialised; no further work is done
    Disabled,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    /// First network connection attempt finished
    NetworkAttempted { connected: bool },
    /// First session connection attempt finished (or was skipped)
    SessionAttempted { connected: bool },
    /// Both sensors initialised
    SensorsReady,
    /// A sensor failed to initialise
    SensorsFailed,
    /// A measurement cycle started
    CycleStarted,
    /// A measurement cycle finished
    CycleFinished,
}

/// Result of a state transition attempt
#[derive(Debug, Clone)]
pub enum TransitionResult {
    /// Transition was valid; contains the (possibly unchanged) state
    Success(StationState),
    /// Transition was invalid from current state
    Invalid { from: StationState, event: StationEvent },
}

/// The lifecycle state machine
#[derive(Debug)]
pub struct StationStateMachine {
    current_state: StationState,
    cycles_completed: u64,
}

impl Default for StationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StationStateMachine {
    /// Create a new state machine in Booting state
    pub fn new() -> Self {
        Self {
            current_state: StationState::Booting,
            cycles_completed: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> StationState {
        self.current_state
    }

    /// Number of cycles that ran to completion
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Whether the station can start a measurement cycle
    pub fn can_start_cycle(&self) -> bool {
        self.current_state == StationState::Ready
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: StationEvent) -> TransitionResult {
        match self.get_next_state(&event) {
            Some(state) => {
                if event == StationEvent::CycleFinished {
                    self.cycles_completed += 1;
                }
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    /// Get the next state for a given event, if the transition is valid
    fn get_next_state(&self, event: &StationEvent) -> Option<StationState> {
        use StationEvent::*;
        use StationState::*;

        match (self.current_state, event) {
            // Connection attempts happen while booting and don't move the state
            (Booting, NetworkAttempted { .. }) => Some(Booting),
            (Booting, SessionAttempted { .. }) => Some(Booting),

            (Booting, SensorsReady) => Some(Ready),
            (Booting, SensorsFailed) => Some(Disabled),

            (Ready, CycleStarted) => Some(CycleRunning),
            (CycleRunning, CycleFinished) => Some(Ready),

            // Disabled is terminal; everything else is out of order
            _ => None,
        }
    }
}

/// Check if a transition from one state to another is generally valid
pub fn is_valid_transition(from: StationState, to: StationState) -> bool {
    use StationState::*;

    match (from, to) {
        (Disabled, _) => false,
        (a, b) if a == b => true,
        (Booting, Ready) => true,
        (Booting, Disabled) => true,
        (Ready, CycleRunning) => true,
        (CycleRunning, Ready) => true,
        _ => false,
    }
}

//! Monitoring cycle state machine
//!
//! Type-safe lifecycle control for one monitoring cycle using the
//! state-machines crate. Uses dynamic dispatch mode so the runner can drive
//! transitions from runtime decisions (alert set contents, recovery
//! configuration).

use state_machines::state_machine;

state_machine! {
    name: CycleMachine,
    dynamic: true,  // Runtime dispatch: transitions depend on sampled data
    initial: Idle,
    states: [
        Idle,
        Sampling,
        Evaluating,
        Alerting,
        RecoveryPending,
        RecoveryExecuting,
        ReverifySampling,
        ReverifyEvaluating,
        Reporting
    ],
    events {
        begin {
            transition: { from: Idle, to: Sampling }
        }
        windowed {
            transition: { from: Sampling, to: Evaluating }
        }
        clear {
            transition: { from: Evaluating, to: Idle }
        }
        breach {
            transition: { from: Evaluating, to: Alerting }
        }
        alerted {
            transition: { from: Alerting, to: Idle }
        }
        remediate {
            transition: { from: Alerting, to: RecoveryPending }
        }
        execute {
            transition: { from: RecoveryPending, to: RecoveryExecuting }
        }
        reverify {
            transition: { from: RecoveryExecuting, to: ReverifySampling }
        }
        rewindowed {
            transition: { from: ReverifySampling, to: ReverifyEvaluating }
        }
        report {
            transition: { from: ReverifyEvaluating, to: Reporting }
        }
        complete {
            transition: { from: Reporting, to: Idle }
        }
    }
}

/// One monitoring cycle's lifecycle, driven event by event by the runner.
pub struct Cycle {
    machine: DynamicCycleMachine<()>,
}

impl Cycle {
    pub fn new() -> Self {
        Self {
            machine: CycleMachine::new(()).into_dynamic(),
        }
    }

    /// Current state name
    #[allow(dead_code)] // Public API for cycle introspection
    pub fn state(&self) -> &str {
        self.machine.current_state()
    }

    pub fn begin(&mut self) -> crate::error::Result<()> {
        self.step("begin", CycleMachineEvent::Begin)
    }

    pub fn windowed(&mut self) -> crate::error::Result<()> {
        self.step("windowed", CycleMachineEvent::Windowed)
    }

    pub fn clear(&mut self) -> crate::error::Result<()> {
        self.step("clear", CycleMachineEvent::Clear)
    }

    pub fn breach(&mut self) -> crate::error::Result<()> {
        self.step("breach", CycleMachineEvent::Breach)
    }

    pub fn alerted(&mut self) -> crate::error::Result<()> {
        self.step("alerted", CycleMachineEvent::Alerted)
    }

    pub fn remediate(&mut self) -> crate::error::Result<()> {
        self.step("remediate", CycleMachineEvent::Remediate)
    }

    pub fn execute(&mut self) -> crate::error::Result<()> {
        self.step("execute", CycleMachineEvent::Execute)
    }

    pub fn reverify(&mut self) -> crate::error::Result<()> {
        self.step("reverify", CycleMachineEvent::Reverify)
    }

    pub fn rewindowed(&mut self) -> crate::error::Result<()> {
        self.step("rewindowed", CycleMachineEvent::Rewindowed)
    }

    pub fn report(&mut self) -> crate::error::Result<()> {
        self.step("report", CycleMachineEvent::Report)
    }

    pub fn complete(&mut self) -> crate::error::Result<()> {
        self.step("complete", CycleMachineEvent::Complete)
    }

    fn step(&mut self, name: &str, event: CycleMachineEvent) -> crate::error::Result<()> {
        let state = self.machine.current_state().to_string();
        self.machine
            .handle(event)
            .map_err(|_| crate::error::Error::CycleTransition {
                event: name.to_string(),
                state,
            })
    }
}

impl Default for Cycle {
    fn default() -> Self {
        Self::new()
    }
}

//! A small event-driven interpreter for generated modules.
//!
//! Scheduling follows the usual delta-cycle model: an input change wakes
//! every process sensitive to it; woken processes run one at a time, and
//! blocking assignments they make wake further processes in the same delta.
//! Non-blocking assignments are applied once no process is pending, and the
//! changes they cause start the next delta.
//!
//! Within a delta, pending processes run in a fixed order: the combinational
//! chain, edge detector blocks, the output procedure, then history blocks.
//! Edge detectors therefore read history registers before these are updated,
//! and the output procedure sees every detector raised by the same change.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::trace;
use udpsynth_common::{Logic, Polarity, Transition};
use udpsynth_core::{BranchKind, BranchValue, Guard, ModuleBody, ModuleDesc, Sensitivity};

/// Upper bound on delta cycles per input change.
const MAX_DELTAS: usize = 64;

/// Simulation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// An input column beyond the module's inputs.
    #[error("input column {column} out of range: module has {inputs} inputs")]
    InputOutOfRange {
        /// Requested column.
        column: usize,
        /// Number of inputs.
        inputs: usize,
    },
    /// The module did not settle.
    #[error("no stable state after {deltas} delta cycles")]
    Oscillation {
        /// Deltas executed.
        deltas: usize,
    },
    /// An edge detector was still raised after the change settled.
    #[error("edge detector `{name}` still raised after settling")]
    DetectorStuck {
        /// Detector register.
        name: String,
    },
}

/// One run of the output procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pass {
    /// Edge detectors that were raised when the procedure read them.
    pub fired: Vec<String>,
    /// Output value when the procedure finished.
    pub output: Logic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Process {
    Comb,
    EdgeDetector(usize),
    Output,
    History(usize),
}

/// Interpreter state for one module instance.
#[derive(Debug, Clone)]
pub struct Simulator<'m> {
    module: &'m ModuleDesc,
    inputs: Vec<String>,
    values: HashMap<String, Logic>,
    passes: Vec<Pass>,
}

impl<'m> Simulator<'m> {
    /// Creates an instance with every input unknown and the power-up values
    /// applied.
    #[must_use]
    pub fn new(module: &'m ModuleDesc) -> Self {
        let inputs: Vec<String> = module.inputs().map(str::to_string).collect();
        let mut values: HashMap<String, Logic> = inputs
            .iter()
            .map(|name| (name.clone(), Logic::X))
            .collect();
        values.insert(module.output().to_string(), Logic::X);

        if let ModuleBody::Sequential(seq) = &module.body {
            for history in &seq.histories {
                values.insert(history.reg.clone(), Logic::X);
            }
            for detector in &seq.edge_detectors {
                values.insert(detector.name.clone(), Logic::Zero);
            }
            for detector in &seq.output.level_detectors {
                values.insert(detector.name.clone(), Logic::X);
            }
            values.insert(seq.output.snapshot.clone(), Logic::X);
            if let Some(initial) = seq.initial {
                values.insert(module.output().to_string(), initial);
            }
        }

        Self {
            module,
            inputs,
            values,
            passes: Vec::new(),
        }
    }

    /// Puts the instance in a quiescent state: the given input values (with
    /// history registers agreeing), lowered detectors and output `state`.
    /// No process runs.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InputOutOfRange`] if `inputs` has the wrong length.
    pub fn preset(&mut self, inputs: &[Logic], state: Logic) -> Result<(), SimError> {
        if inputs.len() != self.inputs.len() {
            return Err(SimError::InputOutOfRange {
                column: inputs.len(),
                inputs: self.inputs.len(),
            });
        }
        for (name, value) in self.inputs.iter().zip(inputs) {
            self.values.insert(name.clone(), *value);
        }
        if let ModuleBody::Sequential(seq) = &self.module.body {
            for history in &seq.histories {
                let value = self.get(&history.input);
                self.values.insert(history.reg.clone(), value);
            }
            for detector in &seq.edge_detectors {
                self.values.insert(detector.name.clone(), Logic::Zero);
            }
        }
        self.values.insert(self.module.output().to_string(), state);
        Ok(())
    }

    /// Current value of a signal; unknown for names the module lacks.
    #[must_use]
    pub fn get(&self, signal: &str) -> Logic {
        self.values.get(signal).copied().unwrap_or(Logic::X)
    }

    /// Current output value.
    #[must_use]
    pub fn output(&self) -> Logic {
        self.get(self.module.output())
    }

    /// Current input values in column order.
    #[must_use]
    pub fn inputs(&self) -> Vec<Logic> {
        self.inputs.iter().map(|name| self.get(name)).collect()
    }

    /// Every output-procedure run so far.
    #[must_use]
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Forgets recorded passes.
    pub fn clear_passes(&mut self) {
        self.passes.clear();
    }

    /// Drives input `column` to `value` and runs until the module settles.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] for a bad column, a module that does not
    /// settle, or a detector left raised.
    pub fn set_input(&mut self, column: usize, value: Logic) -> Result<(), SimError> {
        let name = self
            .inputs
            .get(column)
            .cloned()
            .ok_or(SimError::InputOutOfRange {
                column,
                inputs: self.inputs.len(),
            })?;
        let Some(change) = self.assign(&name, value) else {
            return Ok(());
        };
        trace!("{}: {} {}", self.module.name, name, change);
        self.settle(vec![(name, change)])?;

        if let ModuleBody::Sequential(seq) = &self.module.body {
            if let Some(stuck) = seq
                .edge_detectors
                .iter()
                .find(|d| self.get(&d.name) != Logic::Zero)
            {
                return Err(SimError::DetectorStuck {
                    name: stuck.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Sets a signal, returning the change if its value differs.
    fn assign(&mut self, signal: &str, value: Logic) -> Option<Transition> {
        let old = self.values.insert(signal.to_string(), value).unwrap_or(Logic::X);
        Transition::new(old, value)
    }

    fn settle(&mut self, mut events: Vec<(String, Transition)>) -> Result<(), SimError> {
        for _ in 0..MAX_DELTAS {
            let mut pending: BTreeSet<Process> = BTreeSet::new();
            for (signal, change) in events.drain(..) {
                pending.extend(self.woken(&signal, change));
            }
            if pending.is_empty() {
                return Ok(());
            }

            let mut nonblocking: Vec<(String, Logic)> = Vec::new();
            while let Some(process) = pending.pop_first() {
                for (signal, change) in self.run(process, &mut nonblocking) {
                    pending.extend(self.woken(&signal, change));
                }
            }
            for (signal, value) in nonblocking {
                if let Some(change) = self.assign(&signal, value) {
                    events.push((signal, change));
                }
            }
        }
        Err(SimError::Oscillation { deltas: MAX_DELTAS })
    }

    /// Processes woken by `change` on `signal`.
    fn woken(&self, signal: &str, change: Transition) -> Vec<Process> {
        let edge = |polarity: Polarity| change.polarity() == polarity;
        match &self.module.body {
            ModuleBody::Combinational(comb) => comb
                .sensitivity
                .iter()
                .any(|s| s == signal)
                .then_some(Process::Comb)
                .into_iter()
                .collect(),
            ModuleBody::Sequential(seq) => {
                let mut woken = Vec::new();
                woken.extend(
                    seq.edge_detectors
                        .iter()
                        .enumerate()
                        .filter(|(_, d)| d.input == signal && edge(d.polarity))
                        .map(|(i, _)| Process::EdgeDetector(i)),
                );
                if seq.output.sensitivity.iter().any(|s| match s {
                    Sensitivity::Any(name) => name == signal,
                    Sensitivity::Edge(polarity, name) => name == signal && edge(*polarity),
                }) {
                    woken.push(Process::Output);
                }
                woken.extend(
                    seq.histories
                        .iter()
                        .enumerate()
                        .filter(|(_, h)| h.input == signal)
                        .map(|(i, _)| Process::History(i)),
                );
                woken
            }
        }
    }

    fn holds(&self, guard: &Guard) -> bool {
        guard.iter().all(|test| test.accepts(self.get(&test.signal)))
    }

    /// Runs one process. Returns the changes its blocking assignments made
    /// and queues its non-blocking ones.
    fn run(
        &mut self,
        process: Process,
        nonblocking: &mut Vec<(String, Logic)>,
    ) -> Vec<(String, Transition)> {
        let module = self.module;
        let mut changes = Vec::new();
        let mut blocking = |sim: &mut Self, signal: &str, value: Logic| {
            if let Some(change) = sim.assign(signal, value) {
                changes.push((signal.to_string(), change));
            }
        };

        match (&module.body, process) {
            (ModuleBody::Combinational(comb), Process::Comb) => {
                let value = comb
                    .branches
                    .iter()
                    .find(|b| self.holds(&b.guard))
                    .map_or(comb.default, |b| b.value);
                blocking(self, &comb.output, value);
            }
            (ModuleBody::Sequential(seq), Process::EdgeDetector(i)) => {
                let d = &seq.edge_detectors[i];
                let changed = d.history.as_deref().is_none_or(|history| {
                    Transition::new(self.get(history), self.get(&d.input))
                        .is_some_and(|t| d.transitions.contains(t))
                });
                if changed && self.holds(&d.guard) {
                    blocking(self, &d.name, Logic::One);
                }
            }
            (ModuleBody::Sequential(seq), Process::Output) => {
                let out = &seq.output;
                let snapshot = self.get(&out.output);
                blocking(self, &out.snapshot, snapshot);
                for detector in &out.level_detectors {
                    let value = if self.holds(&detector.guard) {
                        Logic::One
                    } else {
                        Logic::Zero
                    };
                    blocking(self, &detector.name, value);
                }

                let mut fired = Vec::new();
                for branch in &out.branches {
                    if self.get(&branch.detector) != Logic::One {
                        continue;
                    }
                    if branch.accepts_state(snapshot) {
                        let value = match branch.value {
                            BranchValue::Drive(v) => v,
                            BranchValue::Hold => self.get(&out.output),
                        };
                        blocking(self, &out.output, value);
                    }
                    if branch.kind == BranchKind::Edge {
                        fired.push(branch.detector.clone());
                        nonblocking.push((branch.detector.clone(), Logic::Zero));
                    }
                }
                self.passes.push(Pass {
                    fired,
                    output: self.get(&out.output),
                });
            }
            (ModuleBody::Sequential(seq), Process::History(i)) => {
                let history = &seq.histories[i];
                nonblocking.push((history.reg.clone(), self.get(&history.input)));
            }
            _ => {}
        }
        changes
    }
}

/// Output of a combinational module for `inputs`, observed after the last
/// input changes into place.
///
/// # Errors
///
/// Propagates [`SimError`] from the interpreter.
pub fn evaluate_combinational(module: &ModuleDesc, inputs: &[Logic]) -> Result<Logic, SimError> {
    let mut sim = Simulator::new(module);
    let Some((&last, rest)) = inputs.split_last() else {
        return Ok(sim.output());
    };
    let before = if last == Logic::Zero {
        Logic::One
    } else {
        Logic::Zero
    };
    let mut start = rest.to_vec();
    start.push(before);
    sim.preset(&start, Logic::X)?;
    sim.set_input(inputs.len() - 1, last)?;
    Ok(sim.output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use udpsynth_common::Config;
    use udpsynth_core::{compile, parse_primitive};
    use Logic::{One, X, Zero};

    fn module(text: &str) -> ModuleDesc {
        compile(&parse_primitive(text).unwrap(), &Config::default())
            .unwrap()
            .0
    }

    #[test]
    fn test_edge_detector_fires_once() {
        let m = module(
            "primitive d(q, clk, d); output q; reg q; input clk, d;
             table r 0 : ? : 0 ; r 1 : ? : 1 ; endtable endprimitive",
        );
        let mut sim = Simulator::new(&m);
        sim.preset(&[Zero, One], X).unwrap();
        sim.set_input(0, One).unwrap();
        assert_eq!(sim.output(), One);
        assert_eq!(sim.passes().len(), 1);
        assert_eq!(sim.passes()[0].fired, ["ev_1_pos"]);
        assert_eq!(sim.get("ev_1_pos"), Zero);

        // data changes alone do nothing
        sim.clear_passes();
        sim.set_input(1, Zero).unwrap();
        assert_eq!(sim.output(), One);
        assert!(sim.passes().iter().all(|p| p.fired.is_empty()));
    }

    #[test]
    fn test_partial_edge_uses_history() {
        let m = module(
            "primitive d(q, clk, d); output q; reg q; input clk, d;
             table r 1 : ? : 1 ; endtable endprimitive",
        );
        let mut sim = Simulator::new(&m);
        sim.preset(&[X, One], Zero).unwrap();
        // x -> 1 is a posedge but not `r`
        sim.set_input(0, One).unwrap();
        assert_eq!(sim.output(), Zero);
        sim.set_input(0, Zero).unwrap();
        sim.set_input(0, One).unwrap();
        assert_eq!(sim.output(), One);
    }

    #[test]
    fn test_bad_column() {
        let m = module("primitive b(y, a); output y; input a; table 0 : 1 ; endtable endprimitive");
        let mut sim = Simulator::new(&m);
        assert_eq!(
            sim.set_input(3, One),
            Err(SimError::InputOutOfRange { column: 3, inputs: 1 })
        );
    }

    #[test]
    fn test_combinational_evaluation() {
        let m = module(
            "primitive b(y, a, b); output y; input a, b; table 0 ? : 1 ; 1 1 : 0 ; endtable endprimitive",
        );
        assert_eq!(evaluate_combinational(&m, &[Zero, X]), Ok(One));
        assert_eq!(evaluate_combinational(&m, &[One, One]), Ok(Zero));
        assert_eq!(evaluate_combinational(&m, &[X, One]), Ok(X));
    }
}

//! Verilog rendering of a [`ModuleDesc`].
//!
//! Rendering is a `Display` implementation over the description; identical
//! descriptions and options always produce identical text.

use std::fmt;

use itertools::Itertools;
use udpsynth_common::{EmitConfig, LevelSet, Logic, Transition};

use crate::ir::{
    BranchKind, BranchValue, CombProcedure, EdgeDetector, Guard, ModuleBody, ModuleDesc,
    OutputProcedure, SeqBody, Sensitivity, SignalTest,
};

/// Renders `module` as Verilog-2001 source text.
#[must_use]
pub fn emit(module: &ModuleDesc, config: &EmitConfig) -> String {
    VerilogModule { module, config }.to_string()
}

/// A module paired with rendering options.
#[derive(Clone, Copy, Debug)]
pub struct VerilogModule<'a> {
    /// Module to render.
    pub module: &'a ModuleDesc,
    /// Rendering options.
    pub config: &'a EmitConfig,
}

/// Test for one value. Unknown also accepts `z`, which table primitives read
/// as unknown.
fn value_test(signal: &str, value: Logic) -> String {
    match value {
        Logic::X => format!("({signal} === 1'bx || {signal} === 1'bz)"),
        known => format!("{signal} === {}", known.verilog()),
    }
}

fn set_test(signal: &str, values: LevelSet) -> String {
    let parts: Vec<String> = values.iter().map(|v| value_test(signal, v)).collect();
    match parts.as_slice() {
        [single] if single.starts_with('(') => single.clone(),
        _ => format!("({})", parts.join(" || ")),
    }
}

fn signal_test(test: &SignalTest) -> String {
    set_test(&test.signal, test.values)
}

/// Conjunction of `terms`; `1'b1` when empty.
fn conjunction(terms: impl IntoIterator<Item = String>) -> String {
    let joined = terms.into_iter().join(" && ");
    if joined.is_empty() {
        "1'b1".to_string()
    } else {
        joined
    }
}

fn guard_terms(guard: &Guard) -> impl Iterator<Item = String> + '_ {
    guard.iter().map(signal_test)
}

fn transition_test(history: &str, input: &str, t: Transition) -> String {
    format!("({} && {})", value_test(history, t.from), value_test(input, t.to))
}

fn sensitivity(list: &[Sensitivity]) -> String {
    list.iter()
        .map(|s| match s {
            Sensitivity::Any(name) => name.clone(),
            Sensitivity::Edge(polarity, name) => format!("{} {name}", polarity.keyword()),
        })
        .join(" or ")
}

impl VerilogModule<'_> {
    fn pad(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        write!(f, "{:width$}", "", width = self.config.indent * level)
    }

    fn line(&self, f: &mut fmt::Formatter<'_>, level: usize, text: &str) -> fmt::Result {
        self.pad(f, level)?;
        writeln!(f, "{text}")
    }

    fn row_comment(
        &self,
        f: &mut fmt::Formatter<'_>,
        level: usize,
        row: usize,
        source: &str,
    ) -> fmt::Result {
        if self.config.row_comments {
            self.line(f, level, &format!("// #{row}: {source}"))?;
        }
        Ok(())
    }

    fn header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.module;
        if self.config.header_comment {
            let kind = match m.body {
                ModuleBody::Combinational(_) => "combinational",
                ModuleBody::Sequential(_) => "sequential",
            };
            writeln!(
                f,
                "// {}: behavioral model of a {kind} table primitive ({} table rows)",
                m.name, m.source_rows
            )?;
        }
        writeln!(
            f,
            "module {} ({});",
            m.name,
            m.ports.iter().map(|p| p.name.as_str()).join(", ")
        )?;
        for port in &m.ports {
            self.line(f, 1, &format!("{} {};", port.direction.keyword(), port.name))?;
        }
        match &m.body {
            ModuleBody::Sequential(SeqBody {
                initial: Some(value),
                ..
            }) => self.line(f, 1, &format!("reg {} = {};", m.output(), value.verilog())),
            _ => self.line(f, 1, &format!("reg {};", m.output())),
        }
    }

    fn combinational(&self, f: &mut fmt::Formatter<'_>, comb: &CombProcedure) -> fmt::Result {
        writeln!(f)?;
        self.line(
            f,
            1,
            &format!("always @({}) begin", comb.sensitivity.iter().join(" or ")),
        )?;
        for (i, branch) in comb.branches.iter().enumerate() {
            self.row_comment(f, 2, branch.row, &branch.source)?;
            let keyword = if i == 0 { "if" } else { "else if" };
            self.line(
                f,
                2,
                &format!(
                    "{keyword} ({}) {} = {};",
                    conjunction(guard_terms(&branch.guard)),
                    comb.output,
                    branch.value.verilog()
                ),
            )?;
        }
        let default = format!("{} = {};", comb.output, comb.default.verilog());
        if comb.branches.is_empty() {
            self.line(f, 2, &default)?;
        } else {
            self.line(f, 2, &format!("else {default}"))?;
        }
        self.line(f, 1, "end")
    }

    fn sequential(&self, f: &mut fmt::Formatter<'_>, seq: &SeqBody) -> fmt::Result {
        let out = &seq.output;
        let registers = std::iter::once(out.snapshot.as_str())
            .chain(seq.histories.iter().map(|h| h.reg.as_str()))
            .chain(seq.edge_detectors.iter().map(|d| d.name.as_str()))
            .chain(out.level_detectors.iter().map(|d| d.name.as_str()));
        for reg in registers {
            self.line(f, 1, &format!("reg {reg};"))?;
        }

        let mut init = Vec::new();
        init.extend(seq.histories.iter().map(|h| format!("{} = 1'bx;", h.reg)));
        init.extend(seq.edge_detectors.iter().map(|d| format!("{} = 1'b0;", d.name)));
        if !init.is_empty() {
            writeln!(f)?;
            self.line(f, 1, "initial begin")?;
            for stmt in &init {
                self.line(f, 2, stmt)?;
            }
            self.line(f, 1, "end")?;
        }

        for history in &seq.histories {
            writeln!(f)?;
            self.line(
                f,
                1,
                &format!("always @({0}) {1} <= {0};", history.input, history.reg),
            )?;
        }

        for detector in &seq.edge_detectors {
            writeln!(f)?;
            self.edge_detector(f, detector)?;
        }

        writeln!(f)?;
        self.output_procedure(f, out)
    }

    fn edge_detector(&self, f: &mut fmt::Formatter<'_>, d: &EdgeDetector) -> fmt::Result {
        self.row_comment(f, 1, d.row, &d.source)?;
        self.line(
            f,
            1,
            &format!("always @({} {})", d.polarity.keyword(), d.input),
        )?;
        let changes = d.history.as_deref().map(|history| {
            let alternatives: Vec<String> = d
                .transitions
                .iter()
                .map(|t| transition_test(history, &d.input, t))
                .collect();
            match alternatives.as_slice() {
                [single] => single.clone(),
                _ => format!("({})", alternatives.join(" || ")),
            }
        });
        let terms: Vec<String> = changes.into_iter().chain(guard_terms(&d.guard)).collect();
        let set = format!("{} = 1'b1;", d.name);
        if terms.is_empty() {
            self.line(f, 2, &set)
        } else {
            self.line(f, 2, &format!("if ({}) {set}", conjunction(terms)))
        }
    }

    fn output_procedure(&self, f: &mut fmt::Formatter<'_>, out: &OutputProcedure) -> fmt::Result {
        self.line(
            f,
            1,
            &format!("always @({}) begin", sensitivity(&out.sensitivity)),
        )?;
        self.line(f, 2, &format!("{} = {};", out.snapshot, out.output))?;
        for detector in &out.level_detectors {
            self.row_comment(f, 2, detector.row, &detector.source)?;
            self.line(
                f,
                2,
                &format!("{} = {};", detector.name, conjunction(guard_terms(&detector.guard))),
            )?;
        }

        for branch in &out.branches {
            let assign = match branch.value {
                BranchValue::Drive(v) => format!("{} = {};", out.output, v.verilog()),
                BranchValue::Hold => format!("{0} = {0};", out.output),
            };
            let state_test = branch.state_guard.map(|set| set_test(&out.snapshot, set));
            match branch.kind {
                BranchKind::Level => {
                    let condition =
                        conjunction(std::iter::once(branch.detector.clone()).chain(state_test));
                    self.line(f, 2, &format!("if ({condition}) {assign}"))?;
                }
                BranchKind::Edge => {
                    self.line(f, 2, &format!("if ({}) begin", branch.detector))?;
                    match state_test {
                        Some(test) => self.line(f, 3, &format!("if ({test}) {assign}"))?,
                        None => self.line(f, 3, &assign)?,
                    }
                    self.line(f, 3, &format!("{} <= 1'b0;", branch.detector))?;
                    self.line(f, 2, "end")?;
                }
            }
        }
        self.line(f, 1, "end")
    }
}

impl fmt::Display for VerilogModule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.header(f)?;
        match &self.module.body {
            ModuleBody::Combinational(comb) => self.combinational(f, comb)?,
            ModuleBody::Sequential(seq) => self.sequential(f, seq)?,
        }
        writeln!(f, "endmodule")
    }
}

#![allow(dead_code)]

use std::path::Path;

use quickcheck::{Arbitrary, Gen};
use udpsynth_common::Logic;

pub const FIXTURES: &[&str] = &["srff.v", "mux.v", "dff.v", "latch.v", "tff.v"];

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures/primitives")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

const INPUT_NAMES: [&str; 3] = ["a", "b", "c"];
const LEVELS: &[&str] = &["0", "1", "x", "?", "b"];
const EDGES: &[&str] = &[
    "r", "f", "p", "n", "*", "(01)", "(10)", "(0x)", "(x1)", "(?0)", "(1?)", "(b0)",
];
const STATES: &[&str] = &["0", "1", "x", "?", "b"];

fn pick(g: &mut Gen, from: &[&'static str]) -> &'static str {
    g.choose(from).copied().unwrap_or("?")
}

fn logic(g: &mut Gen) -> Logic {
    g.choose(&Logic::ALL).copied().unwrap_or(Logic::X)
}

fn source(name: &str, inputs: usize, sequential: bool, table: &str) -> String {
    let ins = INPUT_NAMES[..inputs].join(", ");
    let reg = if sequential { "reg y;\n" } else { "" };
    format!("primitive {name} (y, {ins});\noutput y;\n{reg}input {ins};\ntable\n{table}endtable\nendprimitive\n")
}

/// Source text of a random sequential table over `inputs` inputs.
#[derive(Clone, Debug)]
pub struct SeqTable {
    pub inputs: usize,
    pub text: String,
}

impl Arbitrary for SeqTable {
    fn arbitrary(g: &mut Gen) -> Self {
        let inputs = 1 + usize::arbitrary(g) % 3;
        let rows = 1 + usize::arbitrary(g) % 5;
        let mut table = String::new();
        for _ in 0..rows {
            let edge = bool::arbitrary(g).then(|| usize::arbitrary(g) % inputs);
            let cells: Vec<&str> = (0..inputs)
                .map(|i| {
                    if edge == Some(i) {
                        pick(g, EDGES)
                    } else {
                        pick(g, LEVELS)
                    }
                })
                .collect();
            table.push_str(&format!(
                "{} : {} : {} ;\n",
                cells.join(" "),
                pick(g, STATES),
                pick(g, &["0", "1", "x", "-"])
            ));
        }
        Self {
            inputs,
            text: source("rnd_seq", inputs, true, &table),
        }
    }
}

/// Source text of a random combinational table over `inputs` inputs.
#[derive(Clone, Debug)]
pub struct CombTable {
    pub inputs: usize,
    pub text: String,
}

impl Arbitrary for CombTable {
    fn arbitrary(g: &mut Gen) -> Self {
        let inputs = 1 + usize::arbitrary(g) % 3;
        let rows = 1 + usize::arbitrary(g) % 6;
        let mut table = String::new();
        for _ in 0..rows {
            let cells: Vec<&str> = (0..inputs).map(|_| pick(g, LEVELS)).collect();
            table.push_str(&format!("{} : {} ;\n", cells.join(" "), pick(g, &["0", "1", "x"])));
        }
        Self {
            inputs,
            text: source("rnd_comb", inputs, false, &table),
        }
    }
}

/// A quiescent starting point and one input change.
#[derive(Clone, Debug)]
pub struct Event {
    pub from: Vec<Logic>,
    pub state: Logic,
    pub column: usize,
    pub to: Logic,
}

impl Event {
    /// Input vector after the change, fitted to `inputs` columns.
    pub fn fit(&self, inputs: usize) -> (Vec<Logic>, usize, Vec<Logic>) {
        let old: Vec<Logic> = self.from.iter().copied().cycle().take(inputs).collect();
        let column = self.column % inputs;
        let mut new = old.clone();
        new[column] = self.to;
        (old, column, new)
    }
}

impl Arbitrary for Event {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            from: (0..INPUT_NAMES.len()).map(|_| logic(g)).collect(),
            state: logic(g),
            column: usize::arbitrary(g) % INPUT_NAMES.len(),
            to: logic(g),
        }
    }
}

/// A sequence of input changes, as (column, value) pairs.
#[derive(Clone, Debug)]
pub struct Walk(pub Vec<(usize, Logic)>);

impl Arbitrary for Walk {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 24;
        Self(
            (0..len)
                .map(|_| (usize::arbitrary(g) % INPUT_NAMES.len(), logic(g)))
                .collect(),
        )
    }
}

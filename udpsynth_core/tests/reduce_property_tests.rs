#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use quickcheck::{Arbitrary, Gen, TestResult, quickcheck};
use udpsynth_common::{Config, SynthConfig};
use udpsynth_core::{ModuleBody, compile, parse_primitive, reduce};

const LEVELS: &[&str] = &["0", "1", "x", "?", "b"];
const EDGES: &[&str] = &["r", "f", "p", "n", "*", "(01)", "(0x)", "(x1)", "(?0)", "(1?)"];
const STATES: &[&str] = &["0", "1", "x", "?", "b"];
const OUTPUTS: &[&str] = &["0", "1", "x", "-"];

/// Source text of a random two- or three-input sequential table.
#[derive(Clone, Debug)]
struct SeqTable(String);

fn pick(g: &mut Gen, from: &[&'static str]) -> &'static str {
    g.choose(from).copied().unwrap_or("?")
}

impl Arbitrary for SeqTable {
    fn arbitrary(g: &mut Gen) -> Self {
        let inputs = 2 + usize::arbitrary(g) % 2;
        let rows = 1 + usize::arbitrary(g) % 6;
        let mut table = String::new();
        for _ in 0..rows {
            let edge = if bool::arbitrary(g) {
                Some(usize::arbitrary(g) % inputs)
            } else {
                None
            };
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
                pick(g, OUTPUTS)
            ));
        }
        let names = ["a", "b", "c"];
        Self(format!(
            "primitive rnd (q, {ins});\noutput q;\nreg q;\ninput {ins};\ntable\n{table}endtable\nendprimitive\n",
            ins = names[..inputs].join(", ")
        ))
    }
}

quickcheck! {
    fn prop_reduce_is_idempotent(table: SeqTable) -> TestResult {
        let def = parse_primitive(&table.0).expect("generated tables parse");
        let config = SynthConfig::default();
        let Ok(once) = reduce(&def, &config) else {
            return TestResult::discard();
        };
        let twice = reduce(&once, &config).expect("reduced table stays unambiguous");
        TestResult::from_bool(once == twice && once.rows().len() <= def.rows().len())
    }

    fn prop_reduce_keeps_every_driving_row(table: SeqTable) -> TestResult {
        let def = parse_primitive(&table.0).expect("generated tables parse");
        let Ok(reduced) = reduce(&def, &SynthConfig::default()) else {
            return TestResult::discard();
        };
        let expected: Vec<usize> = def
            .rows()
            .iter()
            .filter(|r| !r.is_state_preserving())
            .map(|r| r.index)
            .collect();
        let kept: Vec<usize> = reduced.rows().iter().map(|r| r.index).collect();
        TestResult::from_bool(kept == expected)
    }

    fn prop_one_branch_per_detector(table: SeqTable) -> TestResult {
        let def = parse_primitive(&table.0).expect("generated tables parse");
        let Ok((module, _, _)) = compile(&def, &Config::default()) else {
            return TestResult::discard();
        };
        match module.body {
            ModuleBody::Sequential(seq) => {
                let detectors = seq.edge_detectors.len() + seq.output.level_detectors.len();
                TestResult::from_bool(detectors == seq.output.branches.len())
            }
            ModuleBody::Combinational(_) => TestResult::failed(),
        }
    }
}

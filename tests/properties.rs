use proptest::prelude::*;
use rust_mbf::{
    partition, BracketStrategy, HaltPolicy, Machine, MachineConfig, NullSource, Program,
    StepOutcome, Tape,
};

fn source_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just('+'),
            Just('-'),
            Just('<'),
            Just('>'),
            Just('['),
            Just(']'),
            Just('.'),
            Just(' '),
            Just('x'),
            Just('\n'),
        ],
        0..64,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Every loop clears the cell under the pointer right before its `]`, so
/// every generated program terminates.
fn terminating_program() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("+".to_string()),
        Just("-".to_string()),
        Just(">".to_string()),
        Just("<".to_string()),
        Just(".".to_string()),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 1..4).prop_map(|v| v.concat()),
            inner.prop_map(|body| format!("[{body}[-]]")),
        ]
    })
}

proptest! {
    #[test]
    fn round_robin_reinterleave_reconstructs_source(source in source_text(), n in 1usize..6) {
        let parts = partition(&source, n).unwrap();
        let mut rebuilt = String::new();
        let longest = parts.iter().map(Program::len).max().unwrap_or(0);
        for i in 0..longest {
            for part in &parts {
                if let Some(op) = part.get(i) {
                    rebuilt.push(op.as_char());
                }
            }
        }
        prop_assert_eq!(rebuilt, Program::parse(&source).to_string());

        let lens: Vec<usize> = parts.iter().map(Program::len).collect();
        let min = lens.iter().copied().min().unwrap_or(0);
        prop_assert!(longest - min <= 1);
    }

    #[test]
    fn scan_and_table_strategies_agree(source in source_text(), n in 1usize..4) {
        let mut outcomes = Vec::new();
        for brackets in [BracketStrategy::Scan, BracketStrategy::Table] {
            let config = MachineConfig { processors: n, halt: HaltPolicy::FirstFinished, brackets };
            let mut machine = Machine::with_config(config, &source).unwrap();
            let mut out: Vec<u8> = Vec::new();
            // Cap work: arbitrary loops may never terminate.
            let result = run_bounded(&mut machine, &mut out, 4096);
            let state: Vec<_> = machine
                .snapshot()
                .processors
                .into_iter()
                .map(|p| (p.instruction_pointer, p.data_pointer, p.tape))
                .collect();
            outcomes.push((out, result, state));
        }
        prop_assert_eq!(&outcomes[0], &outcomes[1]);
    }

    #[test]
    fn terminating_programs_finish_identically_on_both_strategies(source in terminating_program()) {
        let mut outcomes = Vec::new();
        for brackets in [BracketStrategy::Scan, BracketStrategy::Table] {
            let config = MachineConfig { brackets, ..MachineConfig::default() };
            let mut machine = Machine::with_config(config, &source).unwrap();
            let mut out: Vec<u8> = Vec::new();
            // `-+.` can still print an overflowed 256, which faults.
            let result = machine.run(&mut out, &mut NullSource).map_err(|e| e.to_string());
            if result.is_ok() {
                prop_assert!(machine.all_finished());
            }
            let tapes: Vec<_> = machine.snapshot().processors.into_iter().map(|p| p.tape).collect();
            outcomes.push((out, result, tapes));
        }
        prop_assert_eq!(&outcomes[0], &outcomes[1]);
    }

    #[test]
    fn decrement_then_increment_is_identity(v in 1i32..=255) {
        let mut tape = Tape::new();
        tape.write(0, v).unwrap();
        tape.decrement(0).unwrap();
        tape.increment(0).unwrap();
        prop_assert_eq!(tape.read(0).unwrap(), v);
    }
}

/// Steps the machine at most `limit` times and describes how the run ended.
fn run_bounded(machine: &mut Machine, out: &mut Vec<u8>, limit: usize) -> String {
    for _ in 0..limit {
        match machine.step(out, &mut NullSource) {
            Ok(StepOutcome::Ticked { .. }) => {}
            Ok(StepOutcome::Halted { on }) => return format!("halted on {on:?}"),
            Err(err) => return err.to_string(),
        }
    }
    "budget exhausted".to_string()
}

//! Property tests for chunk sizing, row order and base-argument placement.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use proptest::prelude::*;
use sql_batch_execer::{
    BaseArgPosition, BatchExecer, BatchSpec, ExecHandle, ExecOutcome, Execer, RenderedStatement,
    SqlValue,
};

#[derive(Default)]
struct CapturingExecer {
    statements: Mutex<Vec<RenderedStatement>>,
}

impl Execer for CapturingExecer {
    fn exec(&self, query: &str, args: &[SqlValue]) -> Result<ExecOutcome> {
        self.statements.lock().push(RenderedStatement {
            query: query.to_string(),
            args: args.to_vec(),
        });
        Ok(ExecOutcome::default())
    }
}

#[derive(Debug, Clone)]
struct Scenario {
    cols: usize,
    reserved: usize,
    max_placeholders: usize,
    before: usize,
    after: usize,
    rows: usize,
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (1usize..6, 0usize..5, 0usize..40, 0usize..60).prop_flat_map(|(cols, reserved, extra, rows)| {
        let max_placeholders = reserved + cols + extra;
        (0..=reserved).prop_flat_map(move |base_args| {
            (0..=base_args).prop_map(move |before| Scenario {
                cols,
                reserved,
                max_placeholders,
                before,
                after: base_args - before,
                rows,
            })
        })
    })
}

fn cell(row: usize, col: usize) -> SqlValue {
    SqlValue::Integer((row * 100 + col) as i64)
}

fn run(scenario: &Scenario) -> Vec<RenderedStatement> {
    let execer = Arc::new(CapturingExecer::default());
    let spec = BatchSpec::custom("INSERT INTO t VALUES %s", scenario.cols, "(?)")
        .expect("spec should be created")
        .with_reserved_base_args(scenario.reserved)
        .with_max_placeholders(scenario.max_placeholders);
    let batch = BatchExecer::new(ExecHandle::transaction(execer.clone()), spec)
        .expect("scenario limits leave room for a row");

    for index in 0..scenario.before {
        batch
            .add_base_arg(format!("before-{index}"), BaseArgPosition::Before)
            .expect("before arg fits in reserved slots");
    }
    for index in 0..scenario.after {
        batch
            .add_base_arg(format!("after-{index}"), BaseArgPosition::After)
            .expect("after arg fits in reserved slots");
    }
    for row in 0..scenario.rows {
        batch.add_row((0..scenario.cols).map(|col| cell(row, col)));
    }
    assert_eq!(batch.count(), scenario.rows);

    batch.execute().expect("batch should execute");
    assert_eq!(batch.count(), 0);

    execer.statements.lock().clone()
}

proptest! {
    #[test]
    fn statements_never_exceed_the_placeholder_ceiling(scenario in scenario_strategy()) {
        for statement in run(&scenario) {
            prop_assert!(statement.args.len() <= scenario.max_placeholders);
        }
    }

    #[test]
    fn row_values_keep_insertion_order(scenario in scenario_strategy()) {
        let statements = run(&scenario);
        let base_args = scenario.before + scenario.after;

        let row_values = statements
            .iter()
            .flat_map(|statement| {
                statement.args[scenario.before..statement.args.len() - scenario.after].to_vec()
            })
            .collect::<Vec<_>>();
        let expected = (0..scenario.rows)
            .flat_map(|row| (0..scenario.cols).map(move |col| cell(row, col)))
            .collect::<Vec<_>>();

        prop_assert_eq!(row_values, expected);
        if scenario.rows == 0 {
            prop_assert!(statements.is_empty());
        }
        for statement in &statements {
            prop_assert_eq!((statement.args.len() - base_args) % scenario.cols, 0);
        }
    }

    #[test]
    fn base_args_wrap_every_chunk(scenario in scenario_strategy()) {
        let before = (0..scenario.before)
            .map(|index| SqlValue::Text(format!("before-{index}")))
            .collect::<Vec<_>>();
        let after = (0..scenario.after)
            .map(|index| SqlValue::Text(format!("after-{index}")))
            .collect::<Vec<_>>();

        for statement in run(&scenario) {
            prop_assert_eq!(&statement.args[..scenario.before], before.as_slice());
            prop_assert_eq!(
                &statement.args[statement.args.len() - scenario.after..],
                after.as_slice()
            );
        }
    }
}

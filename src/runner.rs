use super::*;

use std::collections::BTreeMap;

use log::*;
use serde_json::{json, Value};

/// Runs test vectors against a chip.
#[derive(Debug, Clone, Copy)]
pub struct TestRunner<'r> {
    evaluator: Evaluator<'r>,
}

impl<'r> TestRunner<'r> {
    pub fn new(registry: &'r Registry) -> TestRunner<'r> {
        TestRunner {
            evaluator: Evaluator::new(registry),
        }
    }

    /// Returns one [`RowResult`] per row of `vectors`.
    ///
    /// Rows are evaluated as the iterator is advanced. Every row is evaluated,
    /// including the ones after a failing row. Calling `run` again (or cloning
    /// the iterator) starts over from the first row.
    pub fn run<'t>(&self, chip_name: &'t str, vectors: &'t TestVectors) -> RowResults<'r, 't> {
        RowResults {
            evaluator: self.evaluator,
            chip_name,
            rows: vectors.rows().iter().enumerate(),
        }
    }
}

#[derive(Clone)]
pub struct RowResults<'r, 't> {
    evaluator: Evaluator<'r>,
    chip_name: &'t str,
    rows: std::iter::Enumerate<std::slice::Iter<'t, TestRow>>,
}

impl<'r, 't> Iterator for RowResults<'r, 't> {
    type Item = RowResult;

    fn next(&mut self) -> Option<RowResult> {
        let (row_index, row) = self.rows.next()?;
        Some(run_row(self.evaluator, self.chip_name, row_index, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<'r, 't> ExactSizeIterator for RowResults<'r, 't> {}

#[derive(Debug, Clone)]
pub struct RowResult {
    pub row_index: usize,
    /// Line of the row in its `.tst` file.
    pub line: usize,
    pub inputs: Bindings,
    pub expected: Bindings,
    pub actual: Option<Bindings>,
    pub passed: bool,
    /// Output pin => (actual, expected), for each output that did not match.
    pub mismatches: BTreeMap<Name, (bool, bool)>,
    pub error: Option<HdlError>,
}

fn run_row(evaluator: Evaluator, chip_name: &str, row_index: usize, row: &TestRow) -> RowResult {
    let mut result = RowResult {
        row_index,
        line: row.line,
        inputs: row.inputs.clone(),
        expected: row.expected.clone(),
        actual: None,
        passed: false,
        mismatches: BTreeMap::new(),
        error: None,
    };

    let actual = match evaluator.evaluate(chip_name, &row.inputs) {
        Ok(actual) => actual,
        Err(error) => {
            debug!("Row {row_index} of {chip_name} failed to evaluate: {error}");
            result.error = Some(error);
            return result;
        },
    };

    for (pin, expected) in row.expected.iter() {
        match actual.get(pin) {
            Some(value) if value == *expected => (),
            Some(value) => {
                result.mismatches.insert(pin.clone(), (value, *expected));
            },
            None => {
                result.error = Some(HdlError::TestVectorError(row.line, format!("{chip_name} has no output named {pin}")));
            },
        }
    }

    result.passed = result.mismatches.is_empty() && result.error.is_none();
    result.actual = Some(actual);
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub passed: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_results(results: &[RowResult]) -> Summary {
        Summary {
            passed: results.iter().filter(|result| result.passed).count(),
            total: results.len(),
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// The human-readable report printed by the CLI.
pub fn text_report(chip_name: &str, results: &[RowResult]) -> String {
    use std::fmt::Write;

    let summary = Summary::from_results(results);
    let rule = "=".repeat(50);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Testing {chip_name} chip");
    let _ = writeln!(out, "{rule}");
    for result in results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(out, "Test {}: {status}", result.row_index + 1);
        let _ = writeln!(out, "  Inputs:   {}", result.inputs);
        let _ = writeln!(out, "  Expected: {}", result.expected);
        if !result.passed {
            if let Some(actual) = &result.actual {
                let _ = writeln!(out, "  Actual:   {actual}");
            }
            for (pin, (actual, expected)) in &result.mismatches {
                let _ = writeln!(out, "  Mismatch: {pin} was {} but expected {}", *actual as u8, *expected as u8);
            }
            if let Some(error) = &result.error {
                let _ = writeln!(out, "  Error:    {error}");
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Summary: {}/{} tests passed", summary.passed, summary.total);
    if summary.all_passed() {
        let _ = writeln!(out, "All tests passed!");
    } else {
        let _ = writeln!(out, "{} test(s) failed", summary.failed());
    }
    out
}

pub fn json_report(chip_name: &str, results: &[RowResult]) -> Value {
    let summary = Summary::from_results(results);
    let rows: Vec<Value> = results.iter().map(|result| {
        let mismatches: serde_json::Map<String, Value> = result.mismatches
            .iter()
            .map(|(pin, (actual, expected))| (pin.clone(), json!({ "actual": *actual as u8, "expected": *expected as u8 })))
            .collect();

        json!({
            "row": result.row_index,
            "line": result.line,
            "passed": result.passed,
            "inputs": bindings_json(&result.inputs),
            "expected": bindings_json(&result.expected),
            "actual": result.actual.as_ref().map(bindings_json),
            "mismatches": mismatches,
            "error": result.error.as_ref().map(|error| error.to_string()),
        })
    }).collect();

    json!({
        "chip": chip_name,
        "passed": summary.passed,
        "total": summary.total,
        "rows": rows,
    })
}

fn bindings_json(bindings: &Bindings) -> Value {
    let map: serde_json::Map<String, Value> = bindings
        .iter()
        .map(|(name, value)| (name.clone(), json!(*value as u8)))
        .collect();
    Value::Object(map)
}

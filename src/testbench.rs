use super::*;

use std::collections::BTreeSet;

/// The contents of a `.tst` file: a header naming the pins and one row per case.
///
/// ```text
/// // And.tst
/// a, b; out
/// 0, 0; 0
/// 1, 1; 1
/// ```
#[derive(Debug, Clone)]
pub struct TestVectors {
    header_line: usize,
    inputs: Vec<Name>,
    outputs: Vec<Name>,
    rows: Vec<TestRow>,
}

#[derive(Debug, Clone)]
pub struct TestRow {
    /// Line number in the source file, counted from 1.
    pub line: usize,
    pub inputs: Bindings,
    pub expected: Bindings,
}

impl TestVectors {
    /// Builds vectors in code. Each row gives the input values, then the expected output values,
    /// in the order of `inputs` and `outputs`.
    pub fn new(inputs: &[&str], outputs: &[&str], rows: &[(&[bool], &[bool])]) -> TestVectors {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, (input_values, output_values))| TestRow {
                line: i + 2,
                inputs: inputs.iter().cloned().zip(input_values.iter().cloned()).collect(),
                expected: outputs.iter().cloned().zip(output_values.iter().cloned()).collect(),
            })
            .collect();

        TestVectors {
            header_line: 1,
            inputs: inputs.iter().map(|pin| pin.to_string()).collect(),
            outputs: outputs.iter().map(|pin| pin.to_string()).collect(),
            rows,
        }
    }

    pub fn inputs(&self) -> &[Name] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Name] {
        &self.outputs
    }

    pub fn rows(&self) -> &[TestRow] {
        &self.rows
    }

    /// Makes sure the header names exactly the pins of the chip under test.
    pub fn validate_for(&self, chip_name: &str, interface: &Interface) -> Result<(), HdlError> {
        let line = self.header_line;
        for pin in &self.inputs {
            if !interface.has_input(pin) {
                return Err(HdlError::TestVectorError(line, format!("{chip_name} has no input named {pin}")));
            }
        }
        for pin in &self.outputs {
            if !interface.has_output(pin) {
                return Err(HdlError::TestVectorError(line, format!("{chip_name} has no output named {pin}")));
            }
        }
        for pin in &interface.inputs {
            if !self.inputs.contains(pin) {
                return Err(HdlError::TestVectorError(line, format!("Input {pin} of {chip_name} is missing from the header")));
            }
        }
        for pin in &interface.outputs {
            if !self.outputs.contains(pin) {
                return Err(HdlError::TestVectorError(line, format!("Output {pin} of {chip_name} is missing from the header")));
            }
        }
        Ok(())
    }
}

pub fn load_test_vectors<P: AsRef<std::path::Path>>(path: P) -> Result<TestVectors, HdlError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| HdlError::Io(path.to_owned(), e.to_string()))?;
    parse_test_vectors(&text)
}

pub fn parse_test_vectors(text: &str) -> Result<TestVectors, HdlError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_line_no, line)| !line.is_empty() && !line.starts_with("//"));

    let (header_line, header) = match lines.next() {
        Some(header) => header,
        None => return Err(HdlError::TestVectorError(1, "No header line found".to_string())),
    };

    let (inputs, outputs) = split_row(header_line, header)?;
    let inputs: Vec<Name> = inputs.into_iter().map(|pin| pin.to_string()).collect();
    let outputs: Vec<Name> = outputs.into_iter().map(|pin| pin.to_string()).collect();
    let mut seen = BTreeSet::new();
    for pin in inputs.iter().chain(outputs.iter()) {
        if !is_ident(pin) {
            return Err(HdlError::TestVectorError(header_line, format!("Invalid pin name: {pin:?}")));
        }
        if !seen.insert(pin.as_str()) {
            return Err(HdlError::TestVectorError(header_line, format!("Pin {pin} appears more than once in the header")));
        }
    }

    let mut rows = vec![];
    for (line_no, line) in lines {
        let (input_values, output_values) = split_row(line_no, line)?;
        if input_values.len() != inputs.len() || output_values.len() != outputs.len() {
            return Err(HdlError::TestVectorError(
                line_no,
                format!(
                    "Expected {} inputs and {} outputs, found {} and {}",
                    inputs.len(),
                    outputs.len(),
                    input_values.len(),
                    output_values.len(),
                ),
            ));
        }

        let row = TestRow {
            line: line_no,
            inputs: bind_values(line_no, &inputs, &input_values)?,
            expected: bind_values(line_no, &outputs, &output_values)?,
        };
        rows.push(row);
    }

    Ok(TestVectors {
        header_line,
        inputs,
        outputs,
        rows,
    })
}

/// Splits `a, b; out` into `["a", "b"]` and `["out"]`.
fn split_row(line_no: usize, line: &str) -> Result<(Vec<&str>, Vec<&str>), HdlError> {
    let line = match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    };

    let mut halves = line.split(';');
    let (left, right) = match (halves.next(), halves.next(), halves.next()) {
        (Some(left), Some(right), None) => (left, right),
        _ => return Err(HdlError::TestVectorError(line_no, "Expected exactly one ';' separating inputs from outputs".to_string())),
    };

    Ok((split_items(left), split_items(right)))
}

fn split_items(half: &str) -> Vec<&str> {
    half.split(',').map(|item| item.trim()).filter(|item| !item.is_empty()).collect()
}

fn bind_values(line_no: usize, pins: &[Name], values: &[&str]) -> Result<Bindings, HdlError> {
    let mut bindings = Bindings::empty();
    for (pin, value) in pins.iter().zip(values) {
        let value = match *value {
            "0" => false,
            "1" => true,
            other => return Err(HdlError::TestVectorError(line_no, format!("Expected 0 or 1 for {pin}, found {other:?}"))),
        };
        bindings.insert(pin, value);
    }
    Ok(bindings)
}

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

use super::*;

use std::path::PathBuf;

const XOR: &str = "
    CHIP Xor {
        IN a, b;
        OUT out;

        PARTS:
        Not(in=a, out=nota);
        Not(in=b, out=notb);
        And(a=a, b=notb, out=aAndNotb);
        And(a=nota, b=b, out=notaAndb);
        Or(a=aAndNotb, b=notaAndb, out=out);
    }
";

const HALF_ADDER: &str = "
    CHIP HalfAdder {
        IN a, b;
        OUT sum, carry;

        PARTS:
        Xor(a=a, b=b, out=sum);
        And(a=a, b=b, out=carry);
    }
";

fn registry_with(sources: &[&str]) -> Registry {
    let mut registry = Registry::new();
    for source in sources {
        for chip in parse_chips(source).unwrap() {
            registry.add(chip).unwrap();
        }
    }
    registry
}

fn bits(a: bool, b: bool) -> Bindings {
    Bindings::from([("a", a), ("b", b)])
}

const PAIRS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

#[test]
fn nand_truth_table() {
    let registry = Registry::new();
    let evaluator = Evaluator::new(&registry);

    for (a, b) in PAIRS {
        let outputs = evaluator.evaluate("Nand", &bits(a, b)).unwrap();
        assert_eq!(outputs.get("out"), Some(!(a && b)), "Nand({a}, {b})");
        assert_eq!(outputs.len(), 1);
    }
}

#[test]
fn builtin_not() {
    let registry = Registry::new();
    let evaluator = Evaluator::new(&registry);

    for x in [false, true] {
        let outputs = evaluator.evaluate("Not", &Bindings::from([("in", x)])).unwrap();
        assert_eq!(outputs.get("out"), Some(!x));
    }
}

#[test]
fn and_is_not_nand() {
    let registry = registry_with(&["
        CHIP NotNand {
            IN a, b;
            OUT out;
            PARTS:
            Nand(a=a, b=b, out=x);
            Not(in=x, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    for (a, b) in PAIRS {
        let builtin = evaluator.evaluate("And", &bits(a, b)).unwrap();
        let composed = evaluator.evaluate("NotNand", &bits(a, b)).unwrap();
        assert_eq!(builtin, composed, "And({a}, {b})");
        assert_eq!(builtin.get("out"), Some(a && b));
    }
}

#[test]
fn or_is_nand_of_nots() {
    let registry = registry_with(&["
        CHIP NandOfNots {
            IN a, b;
            OUT out;
            PARTS:
            Not(in=a, out=nota);
            Not(in=b, out=notb);
            Nand(a=nota, b=notb, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    for (a, b) in PAIRS {
        let builtin = evaluator.evaluate("Or", &bits(a, b)).unwrap();
        let composed = evaluator.evaluate("NandOfNots", &bits(a, b)).unwrap();
        assert_eq!(builtin, composed, "Or({a}, {b})");
        assert_eq!(builtin.get("out"), Some(a || b));
    }
}

#[test]
fn and_from_nand_and_not() {
    // And is defined by the user here, so leave the built-in out.
    let mut registry = Registry::with_builtins(&[Builtin::Nand, Builtin::Not]);
    registry.add(ChipDef::new(
        "And",
        &["a", "b"],
        &["out"],
        vec![
            Part::new("Nand", &[("a", "a"), ("b", "b"), ("out", "nandOut")]),
            Part::new("Not", &[("in", "nandOut"), ("out", "out")]),
        ],
    )).unwrap();
    let evaluator = Evaluator::new(&registry);

    assert!(!registry.lookup("And").unwrap().is_builtin());
    assert_eq!(evaluator.evaluate("And", &bits(true, true)).unwrap().get("out"), Some(true));
    assert_eq!(evaluator.evaluate("And", &bits(true, false)).unwrap().get("out"), Some(false));
}

#[test]
fn half_adder() {
    let registry = registry_with(&[XOR, HALF_ADDER]);
    let evaluator = Evaluator::new(&registry);

    let outputs = evaluator.evaluate("HalfAdder", &bits(true, true)).unwrap();
    assert_eq!(outputs, Bindings::from([("sum", false), ("carry", true)]));

    let outputs = evaluator.evaluate("HalfAdder", &bits(false, true)).unwrap();
    assert_eq!(outputs, Bindings::from([("sum", true), ("carry", false)]));

    let names: Vec<&str> = outputs.names().collect();
    assert_eq!(names, vec!["sum", "carry"]);
}

#[test]
fn evaluation_is_deterministic() {
    let registry = registry_with(&[XOR, HALF_ADDER]);
    let evaluator = Evaluator::new(&registry);

    for (a, b) in PAIRS {
        let first = evaluator.evaluate("HalfAdder", &bits(a, b)).unwrap();
        let second = evaluator.evaluate("HalfAdder", &bits(a, b)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn parts_may_be_listed_out_of_order() {
    let registry = registry_with(&["
        CHIP Xor {
            IN a, b;
            OUT out;

            PARTS:
            Or(a=aAndNotb, b=notaAndb, out=out);
            And(a=nota, b=b, out=notaAndb);
            And(a=a, b=notb, out=aAndNotb);
            Not(in=b, out=notb);
            Not(in=a, out=nota);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    for (a, b) in PAIRS {
        let outputs = evaluator.evaluate("Xor", &bits(a, b)).unwrap();
        assert_eq!(outputs.get("out"), Some(a != b), "Xor({a}, {b})");
    }
}

#[test]
fn repeated_parts_are_each_evaluated() {
    let registry = registry_with(&["
        CHIP Twice {
            IN in;
            OUT out1, out2;
            PARTS:
            Not(in=in, out=out1);
            Not(in=in, out=out2);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let outputs = evaluator.evaluate("Twice", &Bindings::from([("in", false)])).unwrap();
    assert_eq!(outputs, Bindings::from([("out1", true), ("out2", true)]));
}

#[test]
fn outputs_can_feed_other_parts() {
    let registry = registry_with(&["
        CHIP Both {
            IN a;
            OUT x, y;
            PARTS:
            Not(in=x, out=y);
            Not(in=a, out=x);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let outputs = evaluator.evaluate("Both", &Bindings::from([("a", true)])).unwrap();
    assert_eq!(outputs, Bindings::from([("x", false), ("y", true)]));
}

#[test]
fn empty_chip() {
    let mut registry = Registry::new();
    registry.add(ChipDef::new("Nothing", &[], &[], vec![])).unwrap();
    let evaluator = Evaluator::new(&registry);

    let outputs = evaluator.evaluate("Nothing", &Bindings::empty()).unwrap();
    assert!(outputs.is_empty());
}

#[test]
fn chip_without_parts_cannot_drive_outputs() {
    let registry = registry_with(&["CHIP Wire { IN in; OUT out; }"]);
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("Wire", &Bindings::from([("in", true)]));
    assert!(matches!(result, Err(HdlError::UnboundOutput(chip, pin)) if chip == "Wire" && pin == "out"));
}

#[test]
fn combinational_cycle() {
    let registry = registry_with(&["
        CHIP Loop {
            IN a;
            OUT out;
            PARTS:
            Nand(a=a, b=y, out=x);
            Not(in=x, out=y);
            Not(in=x, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    match evaluator.evaluate("Loop", &Bindings::from([("a", true)])) {
        Err(HdlError::CombinationalCycle(_loc, chip, members)) => {
            assert_eq!(chip, "Loop");
            assert_eq!(members, vec!["#0 Nand".to_string(), "#1 Not".to_string()]);
        },
        other => panic!("Expected a cycle, got {other:?}"),
    }
}

#[test]
fn part_reading_its_own_output() {
    let registry = registry_with(&["
        CHIP Latch {
            IN a;
            OUT out;
            PARTS:
            Nand(a=a, b=out, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("Latch", &Bindings::from([("a", false)]));
    assert!(matches!(result, Err(HdlError::CombinationalCycle(..))), "{result:?}");
}

#[test]
fn chip_containing_itself() {
    let registry = registry_with(&["
        CHIP Forever {
            IN a;
            OUT out;
            PARTS:
            Forever(a=a, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("Forever", &Bindings::from([("a", false)]));
    assert!(matches!(result, Err(HdlError::CombinationalCycle(..))), "{result:?}");
}

#[test]
fn unknown_pin_in_connection() {
    let registry = registry_with(&["
        CHIP Bad {
            IN a, b;
            OUT out;
            PARTS:
            Nand(a=a, c=b, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    match evaluator.evaluate("Bad", &bits(true, true)) {
        Err(HdlError::UnknownPin(Some(part), chip, pin)) => {
            assert_eq!(part.chip, "Bad");
            assert_eq!(part.index, 0);
            assert_eq!(chip, "Nand");
            assert_eq!(pin, "c");
        },
        other => panic!("Expected an unknown pin, got {other:?}"),
    }

    let errors = registry.check("Bad").unwrap_err();
    assert!(errors.iter().any(|error| matches!(error, HdlError::MissingInput(Some(_), chip, pin) if chip == "Nand" && pin == "b")));
}

#[test]
fn unknown_chip() {
    let registry = registry_with(&["
        CHIP UsesMux {
            IN a, b, sel;
            OUT out;
            PARTS:
            Mux(a=a, b=b, sel=sel, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("UsesMux", &Bindings::from([("a", true), ("b", false), ("sel", true)]));
    match result {
        Err(error) => {
            assert!(matches!(&error, HdlError::UnknownChip(Some(_), name) if name == "Mux"), "{error:?}");
            assert_eq!(error.chip(), Some("UsesMux"));
            assert_eq!(error.part_index(), Some(0));
        },
        other => panic!("Expected an unknown chip, got {other:?}"),
    }

    let result = evaluator.evaluate("Mux", &Bindings::empty());
    assert!(matches!(result, Err(HdlError::UnknownChip(None, name)) if name == "Mux"));
}

#[test]
fn evaluate_checks_input_bindings() {
    let registry = Registry::new();
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("And", &Bindings::from([("a", true)]));
    assert!(matches!(result, Err(HdlError::MissingInput(None, chip, pin)) if chip == "And" && pin == "b"));

    let result = evaluator.evaluate("And", &Bindings::from([("a", true), ("b", true), ("c", true)]));
    assert!(matches!(result, Err(HdlError::UnknownPin(None, chip, pin)) if chip == "And" && pin == "c"));

    // Signal names are case-sensitive.
    let result = evaluator.evaluate("And", &Bindings::from([("A", true), ("b", true)]));
    assert!(matches!(result, Err(HdlError::UnknownPin(None, _, pin)) if pin == "A"));
}

#[test]
fn unbound_output() {
    let registry = registry_with(&["
        CHIP Half {
            IN a;
            OUT out, other;
            PARTS:
            Not(in=a, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("Half", &Bindings::from([("a", true)]));
    assert!(matches!(result, Err(HdlError::UnboundOutput(chip, pin)) if chip == "Half" && pin == "other"));
}

#[test]
fn unresolved_signal() {
    let registry = registry_with(&["
        CHIP Ghost {
            IN a;
            OUT out;
            PARTS:
            Not(in=ghost, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    let result = evaluator.evaluate("Ghost", &Bindings::from([("a", true)]));
    assert!(matches!(result, Err(HdlError::UnresolvedSignal(part, signal)) if part.index == 0 && signal == "ghost"));
}

#[test]
fn multiple_drivers() {
    let registry = registry_with(&["
        CHIP Fight {
            IN a, b;
            OUT out;
            PARTS:
            Not(in=a, out=out);
            Not(in=b, out=out);
        }
    "]);

    let errors = registry.check("Fight").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], HdlError::MultipleDrivers(part, signal) if part.index == 1 && signal == "out"));

    let registry = registry_with(&["
        CHIP Mixed {
            IN a, b;
            OUT out;
            PARTS:
            And(a=a, b=b, out=out);
            Or(a=a, b=b, out=out);
        }
    "]);
    assert!(matches!(&registry.check("Mixed").unwrap_err()[0], HdlError::MultipleDrivers(..)));
}

#[test]
fn identical_parts_may_drive_the_same_signal() {
    let registry = registry_with(&["
        CHIP Dup {
            IN a;
            OUT out;
            PARTS:
            Not(in=a, out=out);
            Not(in=a, out=out);
        }
    "]);
    let evaluator = Evaluator::new(&registry);

    assert!(registry.check("Dup").is_ok());
    let outputs = evaluator.evaluate("Dup", &Bindings::from([("a", true)])).unwrap();
    assert_eq!(outputs, Bindings::from([("out", false)]));
}

#[test]
fn duplicate_chip() {
    let mut registry = Registry::new();
    let result = registry.register("Nand", Builtin::Nand);
    assert!(matches!(result, Err(HdlError::DuplicateChip(_, name)) if name == "Nand"));

    registry.add(ChipDef::new("Nothing", &[], &[], vec![])).unwrap();
    let result = registry.add(ChipDef::new("Nothing", &[], &[], vec![]));
    assert!(matches!(result, Err(HdlError::DuplicateChip(_, name)) if name == "Nothing"));
}

#[test]
fn registering_clears_stale_checks() {
    let mut registry = registry_with(&[HALF_ADDER]);
    assert!(matches!(&registry.check("HalfAdder").unwrap_err()[0], HdlError::UnknownChip(Some(_), name) if name == "Xor"));

    registry.add(parse_chip(XOR).unwrap()).unwrap();
    assert!(registry.check("HalfAdder").is_ok());
    assert!(registry.check_all().is_ok());
}

#[test]
fn registry_lookup() {
    let registry = registry_with(&[XOR]);

    assert_eq!(registry.chip_names(), vec!["And", "Nand", "Not", "Or", "Xor"]);
    assert!(registry.lookup("Nand").unwrap().is_builtin());
    assert!(matches!(registry.lookup("nand"), Err(HdlError::UnknownChip(None, _))));

    let interface = registry.interface("Not").unwrap();
    assert_eq!(interface.inputs, vec!["in".to_string()]);
    assert_eq!(interface.outputs, vec!["out".to_string()]);
}

const AND_TESTS_ROW_3_WRONG: &str = "
    // row 3 expects the wrong value
    a, b; out
    0, 0; 0
    0, 1; 0
    1, 0; 1
    1, 1; 1
";

#[test]
fn runner_reports_every_row() {
    let registry = Registry::new();
    let runner = TestRunner::new(&registry);
    let vectors = parse_test_vectors(AND_TESTS_ROW_3_WRONG).unwrap();
    vectors.validate_for("And", &registry.interface("And").unwrap()).unwrap();

    let results: Vec<RowResult> = runner.run("And", &vectors).collect();
    assert_eq!(results.len(), 4);

    let failed: Vec<&RowResult> = results.iter().filter(|result| !result.passed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].row_index, 2);
    assert_eq!(failed[0].mismatches.get("out"), Some(&(false, true)));
    assert!(failed[0].error.is_none());

    for index in [0, 1, 3] {
        assert!(results[index].passed, "row {index}");
        assert!(results[index].mismatches.is_empty());
    }

    let summary = Summary::from_results(&results);
    assert_eq!(summary, Summary { passed: 3, total: 4 });
    assert!(!summary.all_passed());
}

#[test]
fn runner_is_lazy_and_restartable() {
    let registry = Registry::new();
    let runner = TestRunner::new(&registry);
    let vectors = parse_test_vectors(AND_TESTS_ROW_3_WRONG).unwrap();

    let mut results = runner.run("And", &vectors);
    assert_eq!(results.len(), 4);
    let first = results.next().unwrap();
    assert_eq!(first.row_index, 0);

    let rest = results.clone();
    assert_eq!(rest.count(), 3);
    assert_eq!(results.count(), 3);

    let again: Vec<usize> = runner.run("And", &vectors).map(|result| result.row_index).collect();
    assert_eq!(again, vec![0, 1, 2, 3]);
}

#[test]
fn runner_keeps_going_after_errors() {
    let registry = registry_with(&["
        CHIP Ghost {
            IN a;
            OUT out;
            PARTS:
            Not(in=ghost, out=out);
        }
    "]);
    let runner = TestRunner::new(&registry);
    let vectors = TestVectors::new(&["a"], &["out"], &[(&[false], &[true]), (&[true], &[false])]);

    let results: Vec<RowResult> = runner.run("Ghost", &vectors).collect();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(!result.passed);
        assert!(result.actual.is_none());
        assert!(matches!(result.error, Some(HdlError::UnresolvedSignal(..))));
    }
}

#[test]
fn reports() {
    let registry = Registry::new();
    let runner = TestRunner::new(&registry);
    let vectors = parse_test_vectors(AND_TESTS_ROW_3_WRONG).unwrap();
    let results: Vec<RowResult> = runner.run("And", &vectors).collect();

    let text = text_report("And", &results);
    assert!(text.contains("Test 3: FAIL"));
    assert!(text.contains("  Actual:   out=0"));
    assert!(text.contains("Summary: 3/4 tests passed"));

    let json = json_report("And", &results);
    assert_eq!(json["passed"], 3);
    assert_eq!(json["total"], 4);
    assert_eq!(json["rows"][2]["passed"], false);
    assert_eq!(json["rows"][2]["mismatches"]["out"]["actual"], 0);
    assert_eq!(json["rows"][2]["mismatches"]["out"]["expected"], 1);
}

#[test]
fn parse_simple_chip() {
    let chip = parse_chip("
        CHIP And {
            IN a, b;
            OUT out;

            PARTS:
            Nand(a=a, b=b, out=nandOut);
            Not(in=nandOut, out=out);
        }
    ").unwrap();

    assert_eq!(chip.name(), "And");
    assert_eq!(chip.inputs(), &["a".to_string(), "b".to_string()]);
    assert_eq!(chip.outputs(), &["out".to_string()]);
    assert_eq!(chip.parts().len(), 2);
    assert_eq!(chip.parts()[0].chip_name(), "Nand");
    assert_eq!(chip.parts()[0].local_for("out"), Some("nandOut"));
    assert_eq!(chip.parts()[1].connections(), &[
        Connection("in".to_string(), "nandOut".to_string()),
        Connection("out".to_string(), "out".to_string()),
    ]);
    assert_eq!(chip.depends_on(), vec!["Nand".to_string(), "Not".to_string()]);
    assert_eq!(chip.parts()[1].loc().start().line(), 8);
}

#[test]
fn parse_comments_and_whitespace() {
    let chip = parse_chip("
        // An inverter.
        /* It has
           one input. */
        CHIP   Inv{IN in;OUT out;
        PARTS:
          Not( in = in , out = out ); // the only part
        }
    ").unwrap();

    assert_eq!(chip.name(), "Inv");
    assert_eq!(chip.parts().len(), 1);
    assert_eq!(chip.parts()[0].local_for("in"), Some("in"));
}

#[test]
fn parse_empty_parts() {
    let chip = parse_chip("CHIP Empty { IN a; OUT out; PARTS: }").unwrap();
    assert!(chip.parts().is_empty());

    let chip = parse_chip("CHIP Bare { }").unwrap();
    assert!(chip.inputs().is_empty());
    assert!(chip.outputs().is_empty());
}

#[test]
fn parse_several_chips() {
    let chips = parse_chips(&format!("{XOR}\n{HALF_ADDER}")).unwrap();
    let names: Vec<&str> = chips.iter().map(|chip| chip.name()).collect();
    assert_eq!(names, vec!["Xor", "HalfAdder"]);

    assert!(parse_chip(&format!("{XOR}\n{HALF_ADDER}")).is_err());
}

#[test]
fn parse_errors() {
    let errors = parse_chips("CHIP Foo {\n    IN a\n    OUT out;\n}").unwrap_err();
    match &errors[0] {
        HdlError::ParseError(loc, message) => {
            assert_eq!(loc.start().line(), 3);
            assert_eq!(loc.start().col(), 5);
            assert!(message.contains("3:5"), "{message}");
        },
        other => panic!("Expected a parse error, got {other:?}"),
    }

    assert!(matches!(&parse_chips("// nothing here").unwrap_err()[0], HdlError::ParseError(..)));
    assert!(matches!(&parse_chips("CHIP { IN a; }").unwrap_err()[0], HdlError::ParseError(..)));
}

#[test]
fn parse_duplicate_pins() {
    let errors = parse_chips("CHIP Dup { IN a, a; OUT out; PARTS: Not(in=a, out=out); }").unwrap_err();
    assert!(matches!(&errors[0], HdlError::DuplicatePin(_, chip, pin) if chip == "Dup" && pin == "a"));

    let errors = parse_chips("CHIP Same { IN a; OUT a; }").unwrap_err();
    assert!(matches!(&errors[0], HdlError::DuplicatePin(_, _, pin) if pin == "a"));

    let errors = parse_chips("CHIP Twice { IN a; OUT out; PARTS: Not(in=a, in=a, out=out); }").unwrap_err();
    assert!(matches!(&errors[0], HdlError::DuplicatePin(_, _, pin) if pin == "in"));

    let errors = parse_chips(&format!("{XOR}\n{XOR}")).unwrap_err();
    assert!(matches!(&errors[0], HdlError::DuplicateChip(_, name) if name == "Xor"));
}

#[test]
fn display_round_trips_through_the_parser() {
    let chip = parse_chip(HALF_ADDER).unwrap();
    let reparsed = parse_chip(&chip.to_string()).unwrap();
    assert_eq!(reparsed.name(), chip.name());
    assert_eq!(reparsed.parts().len(), chip.parts().len());
    assert_eq!(reparsed.parts()[0].connections(), chip.parts()[0].connections());
}

#[test]
fn test_vectors() {
    let vectors = parse_test_vectors("
        // Half adder
        a,b; sum,carry

        0,0; 0,0
        1,1; 0,1 // both set
    ").unwrap();

    assert_eq!(vectors.inputs(), &["a".to_string(), "b".to_string()]);
    assert_eq!(vectors.outputs(), &["sum".to_string(), "carry".to_string()]);
    assert_eq!(vectors.rows().len(), 2);
    assert_eq!(vectors.rows()[1].line, 6);
    assert_eq!(vectors.rows()[1].inputs, bits(true, true));
    assert_eq!(vectors.rows()[1].expected, Bindings::from([("sum", false), ("carry", true)]));
}

#[test]
fn test_vector_errors() {
    assert!(matches!(parse_test_vectors(""), Err(HdlError::TestVectorError(..))));
    assert!(matches!(parse_test_vectors("a, b out"), Err(HdlError::TestVectorError(1, _))));
    assert!(matches!(parse_test_vectors("a; out\n0; 2"), Err(HdlError::TestVectorError(2, _))));
    assert!(matches!(parse_test_vectors("a; out\n0, 1; 1"), Err(HdlError::TestVectorError(2, _))));

    assert!(matches!(parse_test_vectors("a, a, b; out\n1, 0, 1; 1"), Err(HdlError::TestVectorError(1, _))));
    assert!(matches!(parse_test_vectors("// header next\na, b; out, out\n1, 0; 1, 1"), Err(HdlError::TestVectorError(2, _))));
    assert!(matches!(parse_test_vectors("a, b; a\n1, 0; 1"), Err(HdlError::TestVectorError(1, _))));

    let interface = Registry::new().interface("And").unwrap();
    let vectors = parse_test_vectors("a, c; out\n0, 0; 0").unwrap();
    assert!(vectors.validate_for("And", &interface).is_err());
    let vectors = parse_test_vectors("a; out\n0; 0").unwrap();
    assert!(vectors.validate_for("And", &interface).is_err());
    let vectors = parse_test_vectors("b, a; out\n0, 0; 0").unwrap();
    assert!(vectors.validate_for("And", &interface).is_ok());
}

fn write_file(dir: &tempfile::TempDir, filename: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(filename);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn library_loads_nested_chips() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "Xor.hdl", XOR);
    let half_adder = write_file(&dir, "HalfAdder.hdl", HALF_ADDER);

    let (registry, top) = Library::default().load(&half_adder).unwrap();
    assert_eq!(top, "HalfAdder");
    assert!(registry.contains("Xor"));
    assert!(registry.check_all().is_ok());

    let evaluator = Evaluator::new(&registry);
    let outputs = evaluator.evaluate("HalfAdder", &bits(true, false)).unwrap();
    assert_eq!(outputs, Bindings::from([("sum", true), ("carry", false)]));
}

#[test]
fn library_search_dirs() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "lib/Xor.hdl", XOR);
    let half_adder = write_file(&dir, "chips/HalfAdder.hdl", HALF_ADDER);

    let (registry, _top) = Library::default().load(&half_adder).unwrap();
    assert!(!registry.contains("Xor"));
    assert!(matches!(&registry.check("HalfAdder").unwrap_err()[0], HdlError::UnknownChip(Some(_), name) if name == "Xor"));

    let library = Library::new(vec![dir.path().join("lib")]);
    assert_eq!(library.search_dirs(), &[dir.path().join("lib")]);
    let (registry, _top) = library.load(&half_adder).unwrap();
    assert!(registry.contains("Xor"));
    assert!(registry.check("HalfAdder").is_ok());
}

#[test]
fn library_user_defined_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let and = write_file(&dir, "And.hdl", "
        CHIP And {
            IN a, b;
            OUT out;
            PARTS:
            Nand(a=a, b=b, out=nandOut);
            Not(in=nandOut, out=out);
        }
    ");

    let (registry, top) = Library::default().load(&and).unwrap();
    assert_eq!(top, "And");
    assert!(!registry.lookup("And").unwrap().is_builtin());

    let vectors = parse_test_vectors("a, b; out\n0, 0; 0\n0, 1; 0\n1, 0; 0\n1, 1; 1").unwrap();
    let results: Vec<RowResult> = TestRunner::new(&registry).run(&top, &vectors).collect();
    assert!(Summary::from_results(&results).all_passed());
}

#[test]
fn library_chip_file_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "Ping.hdl", "CHIP Ping { IN a; OUT out; PARTS: Pong(a=a, out=out); }");
    let pong = write_file(&dir, "Pong.hdl", "CHIP Pong { IN a; OUT out; PARTS: Ping(a=a, out=out); }");

    let errors = Library::default().load(&pong).unwrap_err();
    assert!(matches!(&errors[0], HdlError::CombinationalCycle(..)));
}

#[test]
fn library_missing_file() {
    let result = Library::default().load("/nonexistent/Nothing.hdl");
    assert!(matches!(&result.unwrap_err()[0], HdlError::Io(..)));
}

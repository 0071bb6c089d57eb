use suture_core::decoder::decode;
use suture_core::opcode::EPILOGUE;
use suture_core::{CodeUnit, Constant, Opcode};
use suture_transform::{Error, InsertConfig, Outcome, insert_code};

fn target() -> CodeUnit {
    // x = 1 / y = x / return, on lines 1, 2, 3
    let mut unit = suture_tests::unit(
        "module",
        "LOAD_CONST 0\nSTORE_NAME 0\nRETURN_NONE",
        &[2, 1, 2, 1],
        1,
    )
    .unwrap();
    unit.names = vec!["x".into()];
    unit.constants = vec![Constant::Int(1)];
    unit.stack_size = 1;
    unit
}

fn snippet() -> CodeUnit {
    let mut unit = suture_tests::unit("snippet", "LOAD_NAME 0\nPOP_TOP\nRETURN_NONE", &[], 1).unwrap();
    unit.names = vec!["log".into()];
    unit
}

#[test]
fn test_end_to_end_insertion() {
    suture_tests::init_tracing();

    let outcome = insert_code(&target(), &snippet(), 2, &InsertConfig::default()).unwrap();
    let rewrite = outcome.rewritten().expect("line 2 exists");
    let unit = &rewrite.unit;

    assert_eq!(unit.code.len(), 10);
    assert_eq!(unit.names, vec!["x".to_string(), "log".to_string()]);

    let ops: Vec<(Opcode, Option<u32>)> = decode(&unit.code)
        .unwrap()
        .into_iter()
        .map(|ins| (ins.op, ins.arg))
        .collect();
    assert_eq!(
        ops,
        vec![
            (Opcode::LOAD_CONST, Some(0)),
            (Opcode::LOAD_NAME, Some(1)),
            (Opcode::POP_TOP, None),
            (Opcode::STORE_NAME, Some(0)),
            (Opcode::RETURN_NONE, None),
        ]
    );

    assert_eq!(unit.line_table, vec![2, 1, 6, 1]);
    assert_eq!(unit.line_starts().unwrap(), vec![(0, 1), (2, 2), (8, 3)]);
    assert_eq!(rewrite.insertions.iter().collect::<Vec<_>>(), vec![(2, 4)]);

    // metadata passes through
    assert_eq!(unit.stack_size, 1);
    assert_eq!(unit.first_line, 1);
    assert_eq!(unit.filename, "module.py");
}

#[test]
fn test_missing_line_is_a_no_op() {
    let target = target();
    let outcome = insert_code(&target, &snippet(), 9, &InsertConfig::default()).unwrap();
    assert_eq!(outcome, Outcome::Unchanged);
    assert!(outcome.rewritten().is_none());
}

#[test]
fn test_symbol_overflow_is_fatal() {
    let mut target = target();
    target.names = (0..256).map(|i| format!("name_{i}")).collect();

    let result = insert_code(&target, &snippet(), 2, &InsertConfig::default());
    match result {
        Err(Error::Capacity { value, site }) => {
            assert_eq!(value, 256);
            assert!(site.contains("name"), "site was {site}");
        }
        other => panic!("expected a capacity error, got {other:?}"),
    }
}

#[test]
fn test_extended_arg_chaining_through_insertion() {
    let asm = format!("JUMP_FORWARD 252\n{}RETURN_NONE", suture_tests::nops(126));
    let target = suture_tests::unit("spin", &asm, &[2, 1], 1).unwrap();
    let snippet = suture_tests::unit("nop", "NOP\nNOP\nRETURN_NONE", &[], 1).unwrap();

    let outcome = insert_code(&target, &snippet, 2, &InsertConfig::default()).unwrap();
    let rewrite = outcome.rewritten().unwrap();

    assert_eq!(
        rewrite.insertions.iter().collect::<Vec<_>>(),
        vec![(0, 2), (4, 4)]
    );
    let jump = &decode(&rewrite.unit.code).unwrap()[0];
    assert_eq!(jump.op, Opcode::JUMP_FORWARD);
    assert_eq!(jump.ext, 1);
    assert_eq!(jump.jump_target(), Some(260));
    assert_eq!(rewrite.unit.code[260], Opcode::RETURN_NONE.to_byte());

    assert_eq!(rewrite.unit.line_table, vec![4, 1]);
    assert_eq!(
        rewrite.unit.line_starts().unwrap(),
        vec![(0, 1), (4, 2)]
    );
}

#[test]
fn test_conditional_snippet_skips_to_original_line() {
    // if enabled: trace()
    let mut snippet = suture_tests::unit(
        "probe",
        "LOAD_GLOBAL 0\nPOP_JUMP_IF_FALSE 12\nLOAD_GLOBAL 1\nCALL_FUNCTION 0\nPOP_TOP\nNOP\nRETURN_NONE",
        &[],
        1,
    )
    .unwrap();
    snippet.names = vec!["enabled".into(), "trace".into()];

    let outcome = insert_code(&target(), &snippet, 3, &InsertConfig::default()).unwrap();
    let unit = &outcome.rewritten().unwrap().unit;

    let instructions = decode(&unit.code).unwrap();
    let cond = instructions
        .iter()
        .find(|ins| ins.op == Opcode::POP_JUMP_IF_FALSE)
        .unwrap();
    // snippet body is 12 bytes at offset 4, so its own end is the RETURN_NONE at 16
    assert_eq!(cond.jump_target(), Some(16));
    assert_eq!(unit.code[16], Opcode::RETURN_NONE.to_byte());
    assert_eq!(unit.names.len(), 3);
}

#[test]
fn test_snippet_shorter_than_epilogue() {
    let mut snippet = snippet();
    snippet.code = Vec::<u8>::new().into();
    let result = insert_code(&target(), &snippet, 2, &InsertConfig::default());
    assert!(matches!(
        result,
        Err(Error::SnippetTooShort { len: 0, epilogue }) if epilogue == EPILOGUE.len()
    ));
}

#[test]
fn test_validation_catches_bad_snippet() {
    let mut snippet = snippet();
    // references a name the snippet does not carry
    snippet.code = suture_core::encoder::assemble("LOAD_NAME 4\nRETURN_NONE").unwrap().into();

    let result = insert_code(&target(), &snippet, 2, &InsertConfig::default());
    assert!(matches!(
        result,
        Err(Error::Core(suture_core::result::Error::SymbolOutOfRange { .. }))
    ));

    let unchecked = InsertConfig {
        validate: false,
        ..InsertConfig::default()
    };
    assert!(insert_code(&target(), &snippet, 2, &unchecked).is_ok());
}

#[test]
fn test_outcome_json_shape() {
    let outcome = insert_code(&target(), &snippet(), 2, &InsertConfig::default()).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["rewritten"]["offset"], 2);
    assert_eq!(json["rewritten"]["unit"]["code"], "40004801010049003100");
    assert_eq!(json["rewritten"]["insertions"]["2"], 4);

    let back: Outcome = serde_json::from_value(json).unwrap();
    assert_eq!(back, outcome);
}

#[test]
fn test_unchanged_serializes_as_string() {
    let json = serde_json::to_string(&Outcome::Unchanged).unwrap();
    assert_eq!(json, "\"unchanged\"");
}

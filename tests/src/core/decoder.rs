use suture_core::decoder::{decode, parse_assembly};
use suture_core::encoder::encode;
use suture_core::result::Error;
use suture_core::{HexBytes, Opcode};

// Fixture: LOAD_CONST 1, EXTENDED_ARG 1, JUMP_ABSOLUTE 0x100 -> 0x0100, RETURN_NONE
const CODE: &str = "0x4001_7f01_6800_3100";

#[test]
fn test_hex_roundtrip() {
    suture_tests::init_tracing();
    let bytes = HexBytes::from_hex(CODE).unwrap();
    let ins = decode(&bytes).unwrap();
    for instruction in &ins {
        tracing::debug!("{}", instruction);
    }
    assert_eq!(ins.len(), 3);
    assert_eq!(ins[1].op, Opcode::JUMP_ABSOLUTE);
    assert_eq!(ins[1].arg, Some(0x100));
    assert_eq!(ins[2].pc, 6);

    assert_eq!(encode(&ins).unwrap(), bytes.into_inner());
}

#[test]
fn test_bad_hex_fails() {
    let result = HexBytes::from_hex("0xZZ42");
    assert!(matches!(result, Err(Error::HexDecode(_))));
}

#[test]
fn test_unknown_opcodes_survive() {
    let ins = decode(&[0x05, 0x00, 0x7a, 0x09]).unwrap();
    assert_eq!(ins[0].op, Opcode::UNKNOWN(0x05));
    assert_eq!(ins[1].op, Opcode::UNKNOWN(0x7a));
    assert_eq!(ins[1].arg, Some(9));
    assert_eq!(encode(&ins).unwrap(), vec![0x05, 0x00, 0x7a, 0x09]);

    let listing = format!("{}\n{}", ins[0], ins[1]);
    assert_eq!(parse_assembly(&listing).unwrap(), ins);
}

#[test]
fn test_invalid_assembly_fails() {
    let result = parse_assembly("LOAD_CONST zero");
    assert!(matches!(result, Err(Error::ParseError { .. })));
    let result = parse_assembly("EXTENDED_ARG 1\nJUMP_ABSOLUTE 0");
    assert!(matches!(result, Err(Error::ParseError { line: 0, .. })));
}

use suture_core::decoder::Instruction;
use suture_core::encoder::{assemble, encode};
use suture_core::result::Error;
use suture_core::validator::validate;
use suture_core::{Constant, Opcode};

#[test]
fn encode_load_const() {
    let ins = Instruction::new(Opcode::LOAD_CONST, Some(3));
    assert_eq!(encode(&[ins]).unwrap(), vec![0x40, 0x03]);
}

#[test]
fn encode_return_none() {
    let ins = Instruction::new(Opcode::RETURN_NONE, None);
    assert_eq!(encode(&[ins]).unwrap(), vec![0x31, 0x00]);
}

#[test]
fn encode_two_prefixes() {
    let ins = Instruction::new(Opcode::JUMP_ABSOLUTE, Some(0x01_00_00));
    assert_eq!(
        encode(&[ins]).unwrap(),
        vec![0x7f, 0x01, 0x7f, 0x00, 0x68, 0x00]
    );
}

#[test]
fn encode_unknown_opcode() {
    let ins = Instruction::new(Opcode::UNKNOWN(0x7e), Some(1));
    assert_eq!(encode(&[ins]).unwrap(), vec![0x7e, 0x01]);
}

#[test]
fn encode_standalone_extended_arg_fails() {
    let ins = Instruction::new(Opcode::EXTENDED_ARG, Some(1));
    assert!(matches!(encode(&[ins]), Err(Error::InvalidOperand(_))));
}

#[test]
fn assembled_units_validate() {
    let mut unit = suture_tests::unit(
        "loop",
        "SETUP_LOOP 12\nLOAD_NAME 0\nGET_ITER\nFOR_ITER 4\nSTORE_FAST 0\nJUMP_ABSOLUTE 6\nPOP_BLOCK\nLOAD_CONST 0\nRETURN_VALUE",
        &[2, 1, 6, 1],
        1,
    )
    .unwrap();
    unit.names = vec!["items".into()];
    unit.locals = vec!["item".into()];
    unit.constants = vec![Constant::None];

    // SETUP_LOOP exits past POP_BLOCK to 14, FOR_ITER exits to POP_BLOCK at 12
    validate(&unit).unwrap();

    let wrong = assemble("JUMP_ABSOLUTE 3\nRETURN_NONE").unwrap();
    unit.code = wrong.into();
    assert!(matches!(
        validate(&unit),
        Err(Error::InvalidJumpTarget { pc: 0, target: 3 })
    ));
}

use suture_core::decoder::decode;
use suture_core::encoder::assemble;
use suture_transform::Error;
use suture_transform::jump_retarget::{rebase, retarget};

#[test]
fn test_jump_retarget_chains_extended_args() {
    suture_tests::init_tracing();

    // JUMP_FORWARD 252 lands on RETURN_NONE at 254
    let asm = format!("JUMP_FORWARD 252\n{}RETURN_NONE", suture_tests::nops(126));
    let code = assemble(&asm).unwrap();
    assert_eq!(code.len(), 256);

    let out = retarget(&code, 2, &assemble("POP_TOP\nPOP_TOP").unwrap()).unwrap();

    // Exactly one prefix in front of the jump
    assert_eq!(out.code[..4], [0x7f, 0x01, 0x60, 0x00]);
    assert_eq!(out.inserted.iter().collect::<Vec<_>>(), vec![(0, 2), (4, 4)]);

    let instructions = decode(&out.code).unwrap();
    assert_eq!(instructions[0].ext, 1);
    assert_eq!(instructions[0].jump_target(), Some(260));
    assert_eq!(out.code.len(), 262);
}

#[test]
fn test_jump_retarget_backward_jump_sees_prefix() {
    // POP_JUMP_IF_FALSE 254 overflows; JUMP_ABSOLUTE 2 behind it must follow the prefix
    let asm = format!(
        "NOP\nPOP_JUMP_IF_FALSE 254\n{}JUMP_ABSOLUTE 2\nRETURN_NONE",
        suture_tests::nops(124)
    );
    let code = assemble(&asm).unwrap();
    assert_eq!(code[254..256], [0x31, 0x00]);
    assert_eq!(code[252..254], [0x68, 0x02]);

    let out = retarget(&code, 4, &[0x00, 0x00]).unwrap();
    let instructions = decode(&out.code).unwrap();

    // the conditional jump now carries a prefix and still reaches RETURN_NONE
    let cond = &instructions[1];
    assert_eq!(cond.pc, 2);
    assert_eq!(cond.ext, 1);
    assert_eq!(cond.jump_target(), Some(out.code.len() - 2));

    // the backward jump lands on the prefix, not inside the chain
    let back = instructions
        .iter()
        .find(|ins| ins.op == suture_core::Opcode::JUMP_ABSOLUTE)
        .unwrap();
    assert_eq!(back.jump_target(), Some(2));
}

#[test]
fn test_rebase_then_splice_keeps_snippet_jumps_local() {
    // snippet: if not x: skip the call; its own end becomes the target's next instruction
    let snippet = assemble("LOAD_NAME 0\nPOP_JUMP_IF_FALSE 6\nPOP_TOP").unwrap();
    let code = assemble("NOP\nNOP\nRETURN_NONE").unwrap();

    let placed = rebase(&snippet, 2).unwrap();
    let out = retarget(&code, 2, &placed).unwrap();

    let instructions = decode(&out.code).unwrap();
    let cond = &instructions[2];
    assert_eq!(cond.op, suture_core::Opcode::POP_JUMP_IF_FALSE);
    // snippet occupies 2..8, the original NOP at 2 now sits at 8
    assert_eq!(cond.jump_target(), Some(8));
    assert_eq!(out.code[8..10], [0x00, 0x00]);
}

#[test]
fn test_retarget_rejects_misaligned_offset() {
    let code = assemble("NOP\nRETURN_NONE").unwrap();
    assert!(matches!(
        retarget(&code, 1, &[0x00, 0x00]),
        Err(Error::InvalidOffset(1))
    ));
    assert!(matches!(
        retarget(&code, 6, &[0x00, 0x00]),
        Err(Error::InvalidOffset(6))
    ));
}

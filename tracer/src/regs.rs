use libc::c_ulong;

use super::WORD;

pub const REG_SP: usize = 13;
pub const REG_LR: usize = 14;
pub const REG_PC: usize = 15;
pub const REG_CPSR: usize = 16;

/// Thumb bit of the ARM processor status register.
pub const CPSR_T_MASK: c_ulong = 1 << 5;

/// Arguments beyond the first four go on the stack.
const ARG_REGS: usize = 4;

/// ARM `pt_regs` layout as PTRACE_GETREGS/SETREGS moves it: r0-r15, cpsr,
/// orig_r0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Regs {
    pub uregs: [c_ulong; 18],
}

/// Programs a register file for a synthetic call following the ARM calling
/// convention: r0-r3 carry the first four arguments, the rest are pushed one
/// word at a time below the current stack pointer. lr is zeroed so the
/// callee's return faults at address 0, which marks call completion. The
/// low bit of `function` selects the Thumb instruction set and is mirrored
/// into cpsr.
///
/// Returns the stack words to write into the target, as (address, word)
/// pairs; the caller performs the writes before resuming.
pub fn program_call(regs: &mut Regs, function: usize, args: &[usize]) -> Vec<(usize, usize)> {
    let mut pushes = Vec::new();
    for (i, &arg) in args.iter().enumerate() {
        if i < ARG_REGS {
            regs.uregs[i] = arg as c_ulong;
        } else {
            regs.uregs[REG_SP] -= WORD as c_ulong;
            pushes.push((regs.uregs[REG_SP] as usize, arg));
        }
    }

    regs.uregs[REG_LR] = 0;
    if function & 1 != 0 {
        regs.uregs[REG_PC] = (function & !1) as c_ulong;
        regs.uregs[REG_CPSR] |= CPSR_T_MASK;
    } else {
        regs.uregs[REG_PC] = function as c_ulong;
        regs.uregs[REG_CPSR] &= !CPSR_T_MASK;
    }
    pushes
}

#[test]
fn test_program_call_register_args() {
    let mut regs = Regs::default();
    regs.uregs[REG_SP] = 0xbef00000;
    let pushes = program_call(&mut regs, 0x40001000, &[1, 2, 3, 4]);
    assert!(pushes.is_empty());
    assert_eq!(&regs.uregs[..4], &[1, 2, 3, 4][..]);
    assert_eq!(regs.uregs[REG_SP], 0xbef00000);
    assert_eq!(regs.uregs[REG_LR], 0);
    assert_eq!(regs.uregs[REG_PC], 0x40001000);
}

#[test]
fn test_program_call_stack_args() {
    let mut regs = Regs::default();
    regs.uregs[REG_SP] = 0xbef00000;
    let pushes = program_call(&mut regs, 0x40001000, &[1, 2, 3, 4, 5, 6]);
    let w = WORD;
    assert_eq!(pushes, vec![(0xbef00000 - w, 5), (0xbef00000 - 2 * w, 6)]);
    assert_eq!(regs.uregs[REG_SP] as usize, 0xbef00000 - 2 * w);
    assert_eq!(&regs.uregs[..4], &[1, 2, 3, 4][..]);
}

#[test]
fn test_program_call_thumb_target() {
    let mut regs = Regs::default();
    regs.uregs[REG_SP] = 0xbef00000;
    program_call(&mut regs, 0x40001001, &[]);
    assert_eq!(regs.uregs[REG_PC], 0x40001000);
    assert_ne!(regs.uregs[REG_CPSR] & CPSR_T_MASK, 0);
}

#[test]
fn test_program_call_arm_target_clears_thumb() {
    let mut regs = Regs::default();
    regs.uregs[REG_SP] = 0xbef00000;
    regs.uregs[REG_CPSR] = CPSR_T_MASK;
    program_call(&mut regs, 0x40001000, &[]);
    assert_eq!(regs.uregs[REG_PC], 0x40001000);
    assert_eq!(regs.uregs[REG_CPSR] & CPSR_T_MASK, 0);
}

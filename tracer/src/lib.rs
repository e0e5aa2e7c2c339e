//! ptrace session against a live target: attach lifecycle, word-granular
//! remote memory access, an ARM foreign-call protocol, and the inject /
//! dump / pattern-search workflows built on top of them.

mod error;
mod ffi;
mod regs;
mod scan;
mod session;

pub use error::Error;
pub use regs::{program_call, Regs, CPSR_T_MASK, REG_CPSR, REG_LR, REG_PC, REG_SP};
pub use scan::{find_pattern, Match, SearchReport};
pub use session::{LoaderSymbols, Session};

/// Machine word size; every ptrace peek/poke moves exactly one of these.
pub const WORD: usize = std::mem::size_of::<usize>();

pub type Result<T, E = Error> = std::result::Result<T, E>;

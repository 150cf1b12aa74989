// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

pub mod names;
pub mod sdt;
pub mod tac;

pub use crate::names::{LabelManager, SymbolTable};
pub use crate::sdt::{translate, SdtError, Translation};
pub use crate::tac::{Instruction, Op, TacProgram};

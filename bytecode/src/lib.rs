mod builder;
mod decoder;
mod instruction;
mod op;

pub use builder::BytecodeBuilder;
pub use decoder::{BytecodeDecoder, DecodeError};
pub use instruction::Instruction;
pub use op::Op;

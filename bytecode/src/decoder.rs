use thiserror::Error;

use crate::instruction::Instruction;
use crate::op::Op;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("`{op}` at offset {offset} is truncated")]
    Truncated { op: Op, offset: usize },
}

/// Decodes a bytecode byte slice into [`Instruction`]s.
///
/// Malformed input yields one [`DecodeError`], after which the decoder
/// reports end of stream.
pub struct BytecodeDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BytecodeDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Byte offset of the next instruction.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Decode the next instruction, or `None` at end of stream.
    pub fn decode_next(&mut self) -> Option<Result<Instruction, DecodeError>> {
        if self.is_at_end() {
            return None;
        }
        let result = self.decode();
        if result.is_err() {
            self.pos = self.bytes.len();
        }
        Some(result)
    }

    fn decode(&mut self) -> Result<Instruction, DecodeError> {
        let offset = self.pos;
        let byte = self.bytes[offset];
        let op = Op::try_from(byte).map_err(|byte| DecodeError::UnknownOpcode { byte, offset })?;
        let end = offset + op.size();
        if end > self.bytes.len() {
            return Err(DecodeError::Truncated { op, offset });
        }
        let operands = &self.bytes[offset + 1..end];
        self.pos = end;

        let u16_at = |i: usize| u16::from_be_bytes([operands[i], operands[i + 1]]);
        let u32_at = |i: usize| {
            u32::from_be_bytes([operands[i], operands[i + 1], operands[i + 2], operands[i + 3]])
        };

        Ok(match op {
            Op::Nil => Instruction::Nil,
            Op::PushSelf => Instruction::PushSelf,
            Op::True => Instruction::True,
            Op::False => Instruction::False,
            Op::PushChar => Instruction::PushChar { code: u16_at(0) },
            Op::PushInt => Instruction::PushInt {
                value: u32_at(0) as i32,
            },
            Op::PushFloat => Instruction::PushFloat {
                value: f32::from_bits(u32_at(0)),
            },
            Op::PushField => Instruction::PushField { index: u16_at(0) },
            Op::PushLocal => Instruction::PushLocal {
                depth: u16_at(0),
                slot: u16_at(2),
            },
            Op::PushLiteral => Instruction::PushLiteral { literal: u16_at(0) },
            Op::PushGlobal => Instruction::PushGlobal { literal: u16_at(0) },
            Op::PushArray => Instruction::PushArray { count: u16_at(0) },
            Op::StoreField => Instruction::StoreField { index: u16_at(0) },
            Op::StoreLocal => Instruction::StoreLocal {
                depth: u16_at(0),
                slot: u16_at(2),
            },
            Op::Pop => Instruction::Pop,
            Op::Send => Instruction::Send {
                argc: u16_at(0),
                selector: u16_at(2),
            },
            Op::SendSuper => Instruction::SendSuper {
                argc: u16_at(0),
                selector: u16_at(2),
            },
            Op::Block => Instruction::Block { index: u16_at(0) },
            Op::BlockReturn => Instruction::BlockReturn,
            Op::Return => Instruction::Return,
            Op::Dbg => Instruction::Dbg {
                file: u16_at(0),
                line: u16_at(2),
                column: u16_at(4),
            },
        })
    }
}

impl Iterator for BytecodeDecoder<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next()
    }
}

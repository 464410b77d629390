use core::fmt;

use crate::op::Op;

/// A decoded instruction.
///
/// Literal-table operands are left as raw indices; rendering them as
/// text needs the owning class's literal table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Nil,
    PushSelf,
    True,
    False,
    PushChar { code: u16 },
    PushInt { value: i32 },
    PushFloat { value: f32 },
    PushField { index: u16 },
    PushLocal { depth: u16, slot: u16 },
    PushLiteral { literal: u16 },
    PushGlobal { literal: u16 },
    PushArray { count: u16 },
    StoreField { index: u16 },
    StoreLocal { depth: u16, slot: u16 },
    Pop,
    Send { argc: u16, selector: u16 },
    SendSuper { argc: u16, selector: u16 },
    Block { index: u16 },
    BlockReturn,
    Return,
    Dbg { file: u16, line: u16, column: u16 },
}

impl Instruction {
    pub fn op(&self) -> Op {
        match self {
            Self::Nil => Op::Nil,
            Self::PushSelf => Op::PushSelf,
            Self::True => Op::True,
            Self::False => Op::False,
            Self::PushChar { .. } => Op::PushChar,
            Self::PushInt { .. } => Op::PushInt,
            Self::PushFloat { .. } => Op::PushFloat,
            Self::PushField { .. } => Op::PushField,
            Self::PushLocal { .. } => Op::PushLocal,
            Self::PushLiteral { .. } => Op::PushLiteral,
            Self::PushGlobal { .. } => Op::PushGlobal,
            Self::PushArray { .. } => Op::PushArray,
            Self::StoreField { .. } => Op::StoreField,
            Self::StoreLocal { .. } => Op::StoreLocal,
            Self::Pop => Op::Pop,
            Self::Send { .. } => Op::Send,
            Self::SendSuper { .. } => Op::SendSuper,
            Self::Block { .. } => Op::Block,
            Self::BlockReturn => Op::BlockReturn,
            Self::Return => Op::Return,
            Self::Dbg { .. } => Op::Dbg,
        }
    }

    /// The literal-table index this instruction refers to, if any.
    pub fn literal(&self) -> Option<u16> {
        match *self {
            Self::PushLiteral { literal } | Self::PushGlobal { literal } => Some(literal),
            Self::Send { selector, .. } | Self::SendSuper { selector, .. } => Some(selector),
            Self::Dbg { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// `mnemonic` padded to a fixed column, then the operands separated by `, `.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op().mnemonic();
        match *self {
            Self::Nil
            | Self::PushSelf
            | Self::True
            | Self::False
            | Self::Pop
            | Self::BlockReturn
            | Self::Return => f.write_str(name),
            Self::PushChar { code } => match char::from_u32(u32::from(code)) {
                Some(c) if !c.is_control() => write!(f, "{name:<15}'{c}'"),
                _ => write!(f, "{name:<15}{code}"),
            },
            Self::PushInt { value } => write!(f, "{name:<15}{value}"),
            Self::PushFloat { value } => write!(f, "{name:<15}{value:?}"),
            Self::PushField { index }
            | Self::StoreField { index }
            | Self::Block { index } => write!(f, "{name:<15}{index}"),
            Self::PushArray { count } => write!(f, "{name:<15}{count}"),
            Self::PushLiteral { literal } | Self::PushGlobal { literal } => {
                write!(f, "{name:<15}#{literal}")
            }
            Self::PushLocal { depth, slot } | Self::StoreLocal { depth, slot } => {
                write!(f, "{name:<15}{depth}, {slot}")
            }
            Self::Send { argc, selector } | Self::SendSuper { argc, selector } => {
                write!(f, "{name:<15}{argc}, #{selector}")
            }
            Self::Dbg { file, line, column } => {
                write!(f, "{name:<15}#{file}, {line}:{column}")
            }
        }
    }
}

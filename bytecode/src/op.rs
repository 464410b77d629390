/// Stack-machine opcodes.
///
/// Every instruction is one opcode byte followed by fixed-width,
/// big-endian operands. Values are the ones the virtual machine's
/// interpreter dispatches on and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Push `nil`.
    Nil = 1,

    /// Push the receiver.
    PushSelf,

    /// Push `true`.
    True,

    /// Push `false`.
    False,

    /// Push a character.
    /// Operands: `code:u16`
    PushChar,

    /// Push a 32-bit integer.
    /// Operands: `value:i32`
    PushInt,

    /// Push a 32-bit float.
    /// Operands: `value:f32`
    PushFloat,

    /// Push a receiver field.
    /// Operands: `index:u16`
    PushField,

    /// Push an argument or temporary of this or an enclosing context.
    /// Operands: `depth:u16`, `slot:u16`
    PushLocal,

    /// Push a string from the class literal table.
    /// Operands: `literal:u16`
    PushLiteral,

    /// Push the global named by a literal.
    /// Operands: `literal:u16`
    PushGlobal,

    /// Pop `count` values and push an array holding them.
    /// Operands: `count:u16`
    PushArray,

    /// Store the top of stack into a receiver field, leaving it on the stack.
    /// Operands: `index:u16`
    StoreField,

    /// Store the top of stack into a context slot, leaving it on the stack.
    /// Operands: `depth:u16`, `slot:u16`
    StoreLocal,

    /// Discard the top of stack.
    Pop,

    /// Send a message to the receiver below the arguments.
    /// Operands: `argc:u16`, `selector:u16`
    Send,

    /// Send a message starting lookup in the superclass.
    /// Operands: `argc:u16`, `selector:u16`
    SendSuper,

    /// Push a closure over the current context.
    /// Operands: `block:u16`
    Block,

    /// Return the top of stack from the current block.
    BlockReturn,

    /// Return the top of stack from the home method.
    Return,

    /// Record a source position.
    /// Operands: `file:u16`, `line:u16`, `column:u16`
    Dbg,
}

impl Op {
    pub const ALL: [Op; 21] = [
        Op::Nil,
        Op::PushSelf,
        Op::True,
        Op::False,
        Op::PushChar,
        Op::PushInt,
        Op::PushFloat,
        Op::PushField,
        Op::PushLocal,
        Op::PushLiteral,
        Op::PushGlobal,
        Op::PushArray,
        Op::StoreField,
        Op::StoreLocal,
        Op::Pop,
        Op::Send,
        Op::SendSuper,
        Op::Block,
        Op::BlockReturn,
        Op::Return,
        Op::Dbg,
    ];

    /// Name used in disassembly listings.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Op::Nil => "nil",
            Op::PushSelf => "self",
            Op::True => "true",
            Op::False => "false",
            Op::PushChar => "push_char",
            Op::PushInt => "push_int",
            Op::PushFloat => "push_float",
            Op::PushField => "push_field",
            Op::PushLocal => "push_local",
            Op::PushLiteral => "push_literal",
            Op::PushGlobal => "push_global",
            Op::PushArray => "push_array",
            Op::StoreField => "store_field",
            Op::StoreLocal => "store_local",
            Op::Pop => "pop",
            Op::Send => "send",
            Op::SendSuper => "send_super",
            Op::Block => "block",
            Op::BlockReturn => "block_return",
            Op::Return => "return",
            Op::Dbg => "dbg",
        }
    }

    /// Number of operand bytes following the opcode.
    pub const fn operand_len(self) -> usize {
        match self {
            Op::Nil
            | Op::PushSelf
            | Op::True
            | Op::False
            | Op::Pop
            | Op::BlockReturn
            | Op::Return => 0,
            Op::PushChar
            | Op::PushField
            | Op::PushLiteral
            | Op::PushGlobal
            | Op::PushArray
            | Op::StoreField
            | Op::Block => 2,
            Op::PushInt
            | Op::PushFloat
            | Op::PushLocal
            | Op::StoreLocal
            | Op::Send
            | Op::SendSuper => 4,
            Op::Dbg => 6,
        }
    }

    /// Encoded size of an instruction with this opcode.
    pub const fn size(self) -> usize {
        1 + self.operand_len()
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            1..=21 => Ok(Self::ALL[byte as usize - 1]),
            _ => Err(byte),
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

//! Opcode table.
//!
//! Each opcode has a fixed parameter shape known to both the compiler and
//! the VM; [`param_size`] is the single source of truth for stepping through
//! an ops buffer. Discriminant values are part of the image format and must
//! never be reordered.

/// VM instruction opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Op {
    Noop = 0,

    // Image structure
    Jump = 1,
    Halt = 2,
    SourceMap = 3,
    Subroutine = 4,
    Main = 5,

    // Control flow
    Return = 6,
    Frame = 7,
    FrameEnd = 8,
    FrameReturnJump = 9,
    Distribute = 10,
    JumpCondition = 11,
    Extends = 12,

    // Calls and stores
    Call = 13,
    TailCall = 14,
    Loads = 15,
    Set = 16,
    Assign = 17,
    Widen = 18,
    Instantiate = 19,
    CallExpression = 20,

    // Functions
    Function = 21,
    FunctionRef = 22,
    Parameter = 23,
    Initializer = 24,

    // Keyword types
    Any = 25,
    Unknown = 26,
    Never = 27,
    Null = 28,
    Undefined = 29,
    Boolean = 30,
    String = 31,
    Number = 32,
    True = 33,
    False = 34,

    // Literals
    StringLiteral = 35,
    NumberLiteral = 36,
    BigIntLiteral = 37,
    TemplateLiteral = 38,

    // Composites
    Union = 39,
    Tuple = 40,
    TupleMember = 41,
    Optional = 42,
    Readonly = 43,
    Rest = 44,
    RestReuse = 45,
    Array = 46,
    ObjectLiteral = 47,
    PropertySignature = 48,
    IndexAccess = 49,
    Length = 50,

    // Generics
    TypeArgument = 51,
    TypeArgumentDefault = 52,

    // Embedded diagnostics
    Error = 53,
}

impl Op {
    /// Decode an opcode byte. Panics on bytes outside the table; the
    /// compiler only ever walks buffers it produced itself.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Noop,
            1 => Self::Jump,
            2 => Self::Halt,
            3 => Self::SourceMap,
            4 => Self::Subroutine,
            5 => Self::Main,
            6 => Self::Return,
            7 => Self::Frame,
            8 => Self::FrameEnd,
            9 => Self::FrameReturnJump,
            10 => Self::Distribute,
            11 => Self::JumpCondition,
            12 => Self::Extends,
            13 => Self::Call,
            14 => Self::TailCall,
            15 => Self::Loads,
            16 => Self::Set,
            17 => Self::Assign,
            18 => Self::Widen,
            19 => Self::Instantiate,
            20 => Self::CallExpression,
            21 => Self::Function,
            22 => Self::FunctionRef,
            23 => Self::Parameter,
            24 => Self::Initializer,
            25 => Self::Any,
            26 => Self::Unknown,
            27 => Self::Never,
            28 => Self::Null,
            29 => Self::Undefined,
            30 => Self::Boolean,
            31 => Self::String,
            32 => Self::Number,
            33 => Self::True,
            34 => Self::False,
            35 => Self::StringLiteral,
            36 => Self::NumberLiteral,
            37 => Self::BigIntLiteral,
            38 => Self::TemplateLiteral,
            39 => Self::Union,
            40 => Self::Tuple,
            41 => Self::TupleMember,
            42 => Self::Optional,
            43 => Self::Readonly,
            44 => Self::Rest,
            45 => Self::RestReuse,
            46 => Self::Array,
            47 => Self::ObjectLiteral,
            48 => Self::PropertySignature,
            49 => Self::IndexAccess,
            50 => Self::Length,
            51 => Self::TypeArgument,
            52 => Self::TypeArgumentDefault,
            53 => Self::Error,
            _ => panic!("invalid opcode: {v}"),
        }
    }
}

/// Number of parameter bytes following an opcode.
pub fn param_size(op: Op) -> usize {
    match op {
        // u32 subroutine index + u16 type argument count
        Op::Call | Op::TailCall => 4 + 2,
        // u32 name address + u32 code address + u8 flags
        Op::Subroutine => 4 + 4 + 1,
        // u16 frame offset + u16 symbol index
        Op::Loads => 2 + 2,
        // signed/unsigned 4-byte relative offsets and addresses
        Op::Jump
        | Op::JumpCondition
        | Op::Distribute
        | Op::FrameReturnJump
        | Op::SourceMap
        | Op::Main
        | Op::Set
        | Op::FunctionRef
        | Op::Parameter
        | Op::TypeArgumentDefault
        | Op::StringLiteral
        | Op::NumberLiteral
        | Op::BigIntLiteral => 4,
        // u16 counts and codes
        Op::Instantiate | Op::CallExpression | Op::Error => 2,
        _ => 0,
    }
}

/// Walk an ops buffer opcode-by-opcode, calling `f(ip, op)` for each
/// instruction and skipping parameter bytes via [`param_size`].
pub fn visit_ops(ops: &[u8], mut f: impl FnMut(usize, Op)) {
    let mut i = 0usize;
    while i < ops.len() {
        let op = Op::from_u8(ops[i]);
        f(i, op);
        i += 1 + param_size(op);
    }
}

/// Embedded (recoverable) error codes carried by [`Op::Error`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u16)]
pub enum ErrorCode {
    /// A referenced identifier is not in scope.
    CannotFind = 1,
}

impl ErrorCode {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            1 => Some(Self::CannotFind),
            _ => None,
        }
    }
}

//! Lexical frames and symbols.
//!
//! Frames live in an arena owned by [`Program`](super::Program) and reference
//! each other by [`FrameId`]; the "current" chain is whatever is reachable
//! from the program's current frame id. Symbols reference their frame by id
//! as well, so nothing here owns anything cyclically.

use crate::ast::Span;

/// Index into the program's frame arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FrameId(pub u32);

/// Address of a symbol: its frame plus its slot within that frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolId {
    pub frame: FrameId,
    pub index: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    /// `const x = true;`
    Variable,
    /// `function x() {}`
    Function,
    /// `class X {}`
    Class,
    /// Nameless subroutine, e.g. a default-type-argument computation.
    Inline,
    /// Type alias or interface.
    Type,
    /// Type parameter, e.g. `T` in `type Id<T> = T`.
    TypeArgument,
    /// Fresh variable introduced by a distributive conditional type.
    TypeVariable,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Slot within the owning frame.
    pub index: u32,
    pub span: Span,
    /// How many declarations share this name in the frame.
    pub declarations: u32,
    /// Subroutine index, for kinds that own one.
    pub routine: Option<u32>,
    pub frame: FrameId,
}

/// One lexical scope. `id` is the frame depth the VM uses to resolve symbol
/// addresses at runtime; it is not unique across siblings.
#[derive(Clone, Debug)]
pub struct Frame {
    pub id: u32,
    pub previous: Option<FrameId>,
    pub conditional: bool,
    pub symbols: Vec<Symbol>,
}

impl Frame {
    pub fn root() -> Self {
        Self {
            id: 0,
            previous: None,
            conditional: false,
            symbols: Vec::new(),
        }
    }

    pub fn child_of(previous: FrameId, previous_depth: u32) -> Self {
        Self {
            id: previous_depth + 1,
            previous: Some(previous),
            conditional: false,
            symbols: Vec::new(),
        }
    }
}

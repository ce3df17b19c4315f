//! Compilation state: frames, storage, subroutines and the main program.
//!
//! `Program` owns everything a single compilation produces. Ops are pushed
//! to the subroutine on top of the active stack, or to the main program when
//! the stack is empty; `emit::build` serializes the result.

mod frame;
mod section;
mod subroutine;

pub use frame::{Frame, FrameId, Symbol, SymbolId, SymbolKind};
pub use subroutine::{SourceMap, Subroutine};


use typerun_bytecode::{ErrorCode, Op, write_i32, write_u16, write_u32};

use crate::ast::Span;
use crate::error::CompileError;

#[derive(Debug)]
pub struct Program {
    /// Ops of the main program — everything outside named subroutines.
    ops: Vec<u8>,
    source_map: SourceMap,

    /// Interned literal texts, in insertion order. Addresses are image byte
    /// offsets, assigned on registration; no deduplication happens here (the
    /// image format reserves a content-hash slot so the VM can deduplicate
    /// at load time).
    storage: Vec<String>,
    storage_index: u32,

    frames: Vec<Frame>,
    current_frame: FrameId,

    subroutines: Vec<Subroutine>,
    /// Emission targets; the top is where `push_op` writes.
    active_subroutines: Vec<u32>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            source_map: SourceMap::default(),
            storage: Vec::new(),
            storage_index: 0,
            frames: vec![Frame::root()],
            current_frame: FrameId(0),
            subroutines: Vec::new(),
            active_subroutines: Vec::new(),
        }
    }

    // --- read access -----------------------------------------------------

    pub fn main_ops(&self) -> &[u8] {
        &self.ops
    }

    pub fn main_source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn storage(&self) -> &[String] {
        &self.storage
    }

    pub fn subroutines(&self) -> &[Subroutine] {
        &self.subroutines
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0 as usize]
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id.0 as usize]
    }

    pub fn current_frame(&self) -> FrameId {
        self.current_frame
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.frame(id.frame).symbols[id.index as usize]
    }

    /// Current instruction pointer of the active emission target.
    pub fn ip(&self) -> u32 {
        match self.active_subroutines.last() {
            Some(&index) => self.subroutines[index as usize].ip(),
            None => self.ops.len() as u32,
        }
    }

    fn target_ops(&mut self) -> &mut Vec<u8> {
        match self.active_subroutines.last() {
            Some(&index) => &mut self.subroutines[index as usize].ops,
            None => &mut self.ops,
        }
    }

    // --- frames ----------------------------------------------------------

    /// Open a frame and emit `Frame` so the VM stays in sync.
    pub(crate) fn push_frame(&mut self) -> FrameId {
        self.push_op(Op::Frame);
        self.push_frame_implicit()
    }

    /// Open a frame without an op — for scopes some other opcode creates in
    /// the VM (subroutine calls, `Distribute`).
    pub(crate) fn push_frame_implicit(&mut self) -> FrameId {
        let depth = self.frame(self.current_frame).id;
        let frame = Frame::child_of(self.current_frame, depth);
        self.frames.push(frame);
        self.current_frame = FrameId((self.frames.len() - 1) as u32);
        self.current_frame
    }

    /// Close the current frame, emitting `FrameEnd`.
    pub(crate) fn pop_frame(&mut self) {
        self.push_op(Op::FrameEnd);
        self.pop_frame_implicit();
    }

    /// Close the current frame without an op — for frames some other opcode
    /// pops in the VM (`Union`, `Tuple`, `ObjectLiteral`, ...).
    pub(crate) fn pop_frame_implicit(&mut self) {
        if let Some(previous) = self.frame(self.current_frame).previous {
            self.current_frame = previous;
        }
    }

    // --- symbols ---------------------------------------------------------

    /// Nearest symbol with this name, walking the frame chain outwards and
    /// each frame's symbols in reverse so later declarations shadow earlier.
    pub fn find_symbol(&self, name: &str) -> Option<SymbolId> {
        let mut current = self.current_frame;
        loop {
            let frame = self.frame(current);
            for symbol in frame.symbols.iter().rev() {
                if symbol.name == name {
                    return Some(SymbolId {
                        frame: current,
                        index: symbol.index,
                    });
                }
            }
            current = frame.previous?;
        }
    }

    /// Declare a symbol in `frame` (the current frame by default). A
    /// same-name symbol already in the frame is reused with its declaration
    /// count bumped — except for `TypeVariable`, which is always fresh.
    pub(crate) fn push_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        span: Span,
        frame: Option<FrameId>,
    ) -> SymbolId {
        let frame_id = frame.unwrap_or(self.current_frame);
        if kind != SymbolKind::TypeVariable {
            let existing = self
                .frame(frame_id)
                .symbols
                .iter()
                .position(|s| s.name == name);
            if let Some(index) = existing {
                let symbol = &mut self.frame_mut(frame_id).symbols[index];
                symbol.declarations += 1;
                return SymbolId {
                    frame: frame_id,
                    index: index as u32,
                };
            }
        }

        let index = self.frame(frame_id).symbols.len() as u32;
        self.frame_mut(frame_id).symbols.push(Symbol {
            name: name.to_owned(),
            kind,
            index,
            span,
            declarations: 1,
            routine: None,
            frame: frame_id,
        });
        SymbolId {
            frame: frame_id,
            index,
        }
    }

    /// Declare a symbol and make sure it owns a subroutine. The routine is
    /// registered (and its index fixed) before any body is compiled, so
    /// forward references resolve. Re-declarations return the existing
    /// symbol and routine unchanged.
    pub(crate) fn push_symbol_for_routine(
        &mut self,
        name: &str,
        kind: SymbolKind,
        span: Span,
    ) -> SymbolId {
        let id = self.push_symbol(name, kind, span, None);
        if self.symbol(id).routine.is_some() {
            return id;
        }

        let mut routine = Subroutine::new(name);
        routine.kind = kind;
        routine.name_address = self.register_storage(name);
        routine.index = self.subroutines.len() as u32;
        let index = routine.index;
        self.subroutines.push(routine);
        self.frame_mut(id.frame).symbols[id.index as usize].routine = Some(index);
        id
    }

    /// Emit a symbol's address: `u16` frame hops from the current frame to
    /// the symbol's frame, then `u16` slot within that frame.
    pub(crate) fn push_symbol_address(&mut self, id: SymbolId) {
        let mut frame_offset = 0u16;
        let mut current = self.current_frame;
        loop {
            if current == id.frame {
                break;
            }
            match self.frame(current).previous {
                Some(previous) => {
                    frame_offset += 1;
                    current = previous;
                }
                None => break,
            }
        }
        self.push_u16(frame_offset);
        self.push_u16(id.index as u16);
    }

    // --- subroutines -----------------------------------------------------

    /// Create a nameless `Inline` routine and make it the emission target.
    pub(crate) fn push_subroutine_nameless(&mut self) -> u32 {
        let mut routine = Subroutine::new("");
        routine.kind = SymbolKind::Inline;
        routine.index = self.subroutines.len() as u32;
        let index = routine.index;

        // Subroutines get an implicit frame from the call convention.
        self.push_frame_implicit();
        self.subroutines.push(routine);
        self.active_subroutines.push(index);
        index
    }

    /// Make the named symbol's routine the emission target.
    pub(crate) fn push_subroutine(&mut self, name: &str) -> Result<u32, CompileError> {
        let id = self
            .find_symbol(name)
            .ok_or_else(|| CompileError::UnknownSubroutine(name.to_owned()))?;
        let index = self
            .symbol(id)
            .routine
            .ok_or_else(|| CompileError::MissingRoutine(name.to_owned()))?;

        self.push_frame_implicit();
        self.active_subroutines.push(index);
        Ok(index)
    }

    /// Finish the active routine: close its section tree, run the tail
    /// analysis, terminate with `Return`.
    pub(crate) fn pop_subroutine(&mut self) -> Result<u32, CompileError> {
        if self.active_subroutines.is_empty() {
            return Err(CompileError::NoActiveSubroutine);
        }
        self.pop_frame_implicit();
        let index = *self.active_subroutines.last().unwrap();
        let routine = &mut self.subroutines[index as usize];
        if routine.ops.is_empty() {
            return Err(CompileError::EmptyRoutine);
        }

        routine.end();
        routine.optimise();
        routine.ops.push(Op::Return as u8);

        self.active_subroutines.pop();
        Ok(index)
    }

    pub(crate) fn register_type_argument_usage(&mut self, symbol_index: u32) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index as usize].register_type_argument_usage(symbol_index);
        }
    }

    // --- op and parameter emission ---------------------------------------

    pub(crate) fn push_op(&mut self, op: Op) {
        match self.active_subroutines.last() {
            Some(&index) => self.subroutines[index as usize].push_op(op),
            None => self.ops.push(op as u8),
        }
    }

    /// Emit an op with a source-map entry for its node.
    pub(crate) fn push_op_at(&mut self, op: Op, span: Span) {
        self.push_source_map(span);
        self.push_op(op);
    }

    pub(crate) fn push_source_map(&mut self, span: Span) {
        match self.active_subroutines.last() {
            Some(&index) => {
                self.subroutines[index as usize].push_source_map(span.pos, span.end);
            }
            None => {
                let ip = self.ops.len() as u32;
                self.source_map.push(ip, span.pos, span.end);
            }
        }
    }

    /// Append a u32 address — a subroutine or storage index resolved at link
    /// time, or an already-valid image offset.
    pub(crate) fn push_address(&mut self, address: u32) {
        let ops = self.target_ops();
        let at = ops.len();
        write_u32(ops, at, address);
    }

    /// Back-patch a u32 address placeholder at `offset`.
    pub(crate) fn patch_address(&mut self, offset: u32, address: u32) {
        write_u32(self.target_ops(), offset as usize, address);
    }

    pub(crate) fn push_i32(&mut self, v: i32) {
        let ops = self.target_ops();
        let at = ops.len();
        write_i32(ops, at, v);
    }

    /// Back-patch a signed relative jump placeholder at `offset`.
    pub(crate) fn patch_i32(&mut self, offset: u32, v: i32) {
        write_i32(self.target_ops(), offset as usize, v);
    }

    pub(crate) fn push_u16(&mut self, v: u16) {
        let ops = self.target_ops();
        let at = ops.len();
        write_u16(ops, at, v);
    }

    /// Embed a recoverable error. Error ops are part of main regardless of
    /// the active routine, so the VM reports them once per execution.
    pub(crate) fn push_error(&mut self, code: ErrorCode, span: Span) {
        self.source_map.push(0, span.pos, span.end);
        self.ops.push(Op::Error as u8);
        let at = self.ops.len();
        write_u16(&mut self.ops, at, code as u16);
    }

    // --- sections (forwarded to the active routine) ----------------------

    pub(crate) fn push_section(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index as usize].push_section();
        }
    }

    pub(crate) fn pop_section(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index as usize].pop_section();
        }
    }

    pub(crate) fn block_tail_call(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index as usize].block_tail_call();
        }
    }

    pub(crate) fn ignore_next_section_op(&mut self) {
        if let Some(&index) = self.active_subroutines.last() {
            self.subroutines[index as usize].ignore_next_section_op();
        }
    }

    // --- storage ---------------------------------------------------------

    /// Intern a literal text, returning its final image address. Addresses
    /// start after the leading `Jump` + u32 and advance by
    /// `8 + 2 + len` (hash + length + data) per entry.
    pub(crate) fn register_storage(&mut self, text: &str) -> u32 {
        if self.storage_index == 0 {
            self.storage_index = 1 + 4;
        }

        let address = self.storage_index;
        self.storage.push(text.to_owned());
        self.storage_index += 8 + 2 + text.len() as u32;
        address
    }

    /// Intern a text and emit its u32 address.
    pub(crate) fn push_storage(&mut self, text: &str) {
        let address = self.register_storage(text);
        self.push_address(address);
    }

    pub(crate) fn push_string_literal(&mut self, text: &str, span: Span) {
        self.push_op_at(Op::StringLiteral, span);
        self.push_storage(text);
    }
}

//! Section tree and tail analysis.
//!
//! A section is a contiguous range of bytecode representing one branch of a
//! conditional type or one straight-line span between branches. Sections
//! form an in-order tree within their subroutine, linked by vector indices
//! (`-1` is the null sentinel). The tree exists solely so `optimise` can
//! decide which sections end the subroutine on every control-flow path —
//! those get their trailing `Call` rewritten to `TailCall` and trailing
//! `Rest` on a type argument rewritten to `RestReuse`.

use log::trace;
use typerun_bytecode::Op;

use super::subroutine::Subroutine;

/// A type-argument read recorded in a section: the symbol's slot in its
/// frame and the instruction pointer right after the `Loads`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TypeArgumentUsage {
    pub symbol_index: u32,
    pub ip: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct Section {
    /// Instruction pointer range.
    pub start: u32,
    pub end: u32,
    pub last_op: Op,
    /// Instructions attributed to this section (children excluded).
    pub ops: u32,
    /// Set on sections executed more than once (distribution) or whose
    /// result is stored rather than returned; blocks tail rewriting.
    pub is_block_tail_call: bool,
    pub has_child: bool,
    pub type_argument_usages: Vec<TypeArgumentUsage>,
    /// Sibling and parent links, `-1` when absent.
    pub next: i32,
    pub up: i32,
}

impl Section {
    pub fn new(start: u32, up: i32) -> Self {
        Self {
            start,
            end: 0,
            last_op: Op::Noop,
            ops: 0,
            is_block_tail_call: false,
            has_child: false,
            type_argument_usages: Vec::new(),
            next: -1,
            up,
        }
    }

    pub fn register_type_argument_usage(&mut self, symbol_index: u32, ip: u32) {
        for usage in &mut self.type_argument_usages {
            if usage.symbol_index == symbol_index {
                usage.ip = ip;
                return;
            }
        }
        self.type_argument_usages
            .push(TypeArgumentUsage { symbol_index, ip });
    }
}

impl Subroutine {
    /// Whether nothing executes after this section within the subroutine:
    /// its sibling chain is empty of instructions.
    fn ended(&self, section: &Section) -> bool {
        if section.next >= 0 {
            self.ended(&self.sections[section.next as usize])
        } else {
            section.ops == 0
        }
    }

    /// Find all tail sections and rewrite their trailing ops.
    ///
    /// A section is a tail section iff it has no child branches, is not
    /// blocked, nothing follows it in its own sibling chain, and every
    /// ancestor is likewise unblocked with an ended sibling chain.
    pub(crate) fn optimise(&mut self) {
        for i in 0..self.sections.len() {
            let section = &self.sections[i];
            if section.has_child {
                continue;
            }
            if section.is_block_tail_call {
                continue;
            }
            if section.next >= 0 && !self.ended(section) {
                continue;
            }

            let mut tail = true;
            let mut up = section.up;
            while up >= 0 {
                let current = &self.sections[up as usize];
                if current.is_block_tail_call || !self.ended(current) {
                    tail = false;
                    break;
                }
                up = current.up;
            }
            if !tail {
                continue;
            }

            let section = &self.sections[i];
            let end = section.end;
            let last_op = section.last_op;
            let usage_ips: Vec<u32> = section.type_argument_usages.iter().map(|u| u.ip).collect();

            if last_op == Op::Call {
                // The Call opcode sits before its u32 routine + u16 count.
                let at = end as usize - 1 - 4 - 2;
                self.ops[at] = Op::TailCall as u8;
                trace!("rewrote Call at ip {at} to TailCall in `{}`", self.identifier);
            }

            for ip in usage_ips {
                if self.ops[ip as usize] == Op::Rest as u8 {
                    self.ops[ip as usize] = Op::RestReuse as u8;
                    trace!("rewrote Rest at ip {ip} to RestReuse in `{}`", self.identifier);
                }
            }
        }
    }
}

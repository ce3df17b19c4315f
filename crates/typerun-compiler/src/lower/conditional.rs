//! Lowering of conditional types.
//!
//! `check extends ext ? T : F` compiles to an `Extends` test plus a
//! `JumpCondition` over two branch sections. When `check` is a bare
//! type-parameter reference the whole conditional distributes: the VM runs
//! it once per union member, binding each member to a fresh type variable,
//! with `Distribute`/`FrameReturnJump` forming the loop. Every relative
//! offset below is back-patched once the branch sizes are known; the VM
//! depends on these exact values.

use typerun_bytecode::Op;

use crate::ast::{ConditionalTypeNode, Identifier, Node};
use crate::error::CompileError;
use crate::program::SymbolKind;

use super::Compiler;

impl Compiler {
    pub(super) fn lower_conditional_type(
        &mut self,
        n: &ConditionalTypeNode,
    ) -> Result<(), CompileError> {
        // Distributive iff the checked type is a plain reference (`T`, not
        // `[T]`, `T | x`, `{a: T}`, ...).
        let distribute_probe: Option<&Identifier> = match &n.check_type {
            Node::TypeReference(reference) => Some(&reference.type_name),
            _ => None,
        };

        self.program.push_section();

        let mut distribute_jump_ip = 0u32;
        if let Some(probe) = distribute_probe {
            // Loads the input type onto the stack; Distribute pops it and
            // feeds the members one by one.
            self.handle(&n.check_type)?;

            // The distribution section runs once per member, so tail calls
            // inside it must stay calls.
            self.program.block_tail_call();
            self.program.push_frame_implicit();

            // Distribute populates the implicit type variable on the stack.
            self.program
                .push_symbol(&probe.escaped_text, SymbolKind::TypeVariable, probe.span, None);

            self.program.push_op(Op::Distribute);
            distribute_jump_ip = self.program.ip();
            self.program.push_address(0);
        }

        let frame = self.program.push_frame();
        self.program.frame_mut(frame).conditional = true;

        self.handle(&n.check_type)?;
        self.handle(&n.extends_type)?;
        self.program.push_op_at(Op::Extends, n.span);

        self.program.push_op(Op::JumpCondition);
        let relative_to = self.program.ip();
        let false_jump_address_ip = self.program.ip();
        // The true branch sits directly behind the parameters.
        self.program.push_address(0);

        self.program.push_section();
        self.handle(&n.true_type)?;
        self.program.pop_section();

        self.program.ignore_next_section_op();
        self.program.push_op(Op::Jump);
        let true_jump_address_ip = self.program.ip();
        self.program.push_address(0);

        let false_program = self.program.ip() + 1;
        self.program.push_section();
        self.handle(&n.false_type)?;
        self.program.pop_section();
        let false_end_ip = self.program.ip();

        self.program.patch_i32(
            false_jump_address_ip,
            false_program as i32 - relative_to as i32,
        );
        self.program.patch_i32(
            true_jump_address_ip,
            false_end_ip as i32 - true_jump_address_ip as i32 + 1,
        );

        if distribute_probe.is_some() {
            self.program
                .patch_address(distribute_jump_ip, false_end_ip - distribute_jump_ip + 6);
            self.program.ignore_next_section_op();
            self.program.push_op(Op::FrameReturnJump);
            let back = -((self.program.ip() - distribute_jump_ip) as i32);
            self.program.push_i32(back);
            self.program.pop_frame_implicit();
        } else {
            self.program.ignore_next_section_op();
            self.program.pop_frame();
        }

        self.program.pop_section();
        Ok(())
    }
}

//! Lowering of type expressions.

use typerun_bytecode::Op;

use crate::ast::{
    ArrayType, IndexedAccessType, Node, RestType, TemplateLiteralType, TupleType, TypeLiteral,
    UnionType,
};
use crate::error::CompileError;

use super::Compiler;

impl Compiler {
    /// Union members evaluate in their own frame; the `Union` op collapses
    /// the frame into one type and pops it in the VM.
    pub(super) fn lower_union_type(&mut self, n: &UnionType) -> Result<(), CompileError> {
        self.program.push_frame();

        for ty in &n.types {
            self.handle(ty)?;
        }

        self.program.push_op_at(Op::Union, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }

    pub(super) fn lower_tuple_type(&mut self, n: &TupleType) -> Result<(), CompileError> {
        self.program.push_frame();

        for element in &n.elements {
            match element {
                Node::NamedTupleMember(member) => {
                    self.handle(&member.ty)?;
                    if member.dot_dot_dot_token.is_some() {
                        self.program.push_op(Op::Rest);
                    }
                    self.program.push_op_at(Op::TupleMember, member.span);
                    if member.question_token.is_some() {
                        self.program.push_op(Op::Optional);
                    }
                }
                Node::OptionalType(optional) => {
                    self.handle(&optional.ty)?;
                    self.program.push_op_at(Op::TupleMember, optional.span);
                    self.program.push_op(Op::Optional);
                }
                _ => {
                    self.handle(element)?;
                    self.program.push_op_at(Op::TupleMember, element.span());
                }
            }
        }

        self.program.push_op_at(Op::Tuple, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }

    pub(super) fn lower_array_type(&mut self, n: &ArrayType) -> Result<(), CompileError> {
        self.handle(&n.element_type)?;
        self.program.push_op_at(Op::Array, n.span);
        Ok(())
    }

    pub(super) fn lower_rest_type(&mut self, n: &RestType) -> Result<(), CompileError> {
        self.handle(&n.ty)?;
        self.program.push_op_at(Op::Rest, n.span);
        Ok(())
    }

    /// `T["length"]` gets the dedicated `Length` op; anything else is a
    /// generic index access.
    pub(super) fn lower_indexed_access_type(
        &mut self,
        n: &IndexedAccessType,
    ) -> Result<(), CompileError> {
        if let Node::LiteralType(literal) = &n.index_type
            && let Node::StringLiteral(string) = &literal.literal
            && string.text == "length"
        {
            self.handle(&n.object_type)?;
            self.program.push_op_at(Op::Length, n.span);
            return Ok(());
        }

        self.handle(&n.object_type)?;
        self.handle(&n.index_type)?;
        self.program.push_op_at(Op::IndexAccess, n.span);
        Ok(())
    }

    pub(super) fn lower_template_literal_type(
        &mut self,
        n: &TemplateLiteralType,
    ) -> Result<(), CompileError> {
        self.program.push_frame();

        if let Some(text) = &n.head.raw_text
            && !text.is_empty()
        {
            self.program.push_op_at(Op::StringLiteral, n.head.span);
            self.program.push_storage(text);
        }

        for (i, span) in n.template_spans.iter().enumerate() {
            self.handle(&span.ty)?;

            if let Some(text) = &span.literal.raw_text
                && !text.is_empty()
            {
                // Middles map to the whole span, the tail to its own text.
                let is_tail = i + 1 == n.template_spans.len();
                let map_span = if is_tail { span.literal.span } else { span.span };
                self.program.push_op_at(Op::StringLiteral, map_span);
                self.program.push_storage(text);
            }
        }

        self.program.push_op_at(Op::TemplateLiteral, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }

    pub(super) fn lower_type_literal(&mut self, n: &TypeLiteral) -> Result<(), CompileError> {
        self.program.push_frame();

        for member in &n.members {
            self.handle(member)?;
        }

        self.program.push_op_at(Op::ObjectLiteral, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }
}

//! Lowering of value expressions and identifier references.

use typerun_bytecode::{ErrorCode, Op};

use crate::ast::{
    ArrayLiteralExpression, BinaryExpression, BinaryOperatorKind, CallExpression,
    ConditionalExpression, ExpressionWithTypeArguments, Identifier, Node,
    ObjectLiteralExpression, TypeReference,
};
use crate::error::CompileError;
use crate::program::SymbolKind;

use super::Compiler;

impl Compiler {
    pub(super) fn lower_identifier(&mut self, n: &Identifier) -> Result<(), CompileError> {
        self.lower_reference(n, &n.type_arguments)
    }

    pub(super) fn lower_type_reference(&mut self, n: &TypeReference) -> Result<(), CompileError> {
        self.lower_reference(&n.type_name, &n.type_arguments)
    }

    /// Shared path for identifier and type references.
    ///
    /// Type arguments and type variables load from the frame stack; anything
    /// else calls its routine. An unresolved name embeds a `CannotFind`
    /// error and evaluates to `Never`.
    fn lower_reference(
        &mut self,
        name: &Identifier,
        type_arguments: &[Node],
    ) -> Result<(), CompileError> {
        let Some(symbol_id) = self.program.find_symbol(&name.escaped_text) else {
            self.program.push_op_at(Op::Never, name.span);
            self.program.push_error(ErrorCode::CannotFind, name.span);
            return Ok(());
        };

        let symbol = self.program.symbol(symbol_id);
        let (kind, index, routine) = (symbol.kind, symbol.index, symbol.routine);

        if kind == SymbolKind::TypeArgument || kind == SymbolKind::TypeVariable {
            self.program.push_op_at(Op::Loads, name.span);
            self.program.push_symbol_address(symbol_id);
            if kind == SymbolKind::TypeArgument {
                self.program.register_type_argument_usage(index);
            }
        } else {
            for argument in type_arguments {
                self.handle(argument)?;
            }

            self.program.push_op_at(Op::Call, name.span);
            let routine =
                routine.ok_or_else(|| CompileError::MissingRoutine(name.escaped_text.clone()))?;
            self.program.push_address(routine);
            self.program.push_u16(type_arguments.len() as u16);
        }
        Ok(())
    }

    pub(super) fn lower_expression_with_type_arguments(
        &mut self,
        n: &ExpressionWithTypeArguments,
    ) -> Result<(), CompileError> {
        for argument in &n.type_arguments {
            self.handle(argument)?;
        }

        self.handle(&n.expression)?;

        if !n.type_arguments.is_empty() {
            self.program.push_op_at(Op::Instantiate, n.span);
            self.program.push_u16(n.type_arguments.len() as u16);
        }
        Ok(())
    }

    pub(super) fn lower_call_expression(&mut self, n: &CallExpression) -> Result<(), CompileError> {
        for argument in &n.type_arguments {
            self.handle(argument)?;
        }

        self.handle(&n.expression)?;

        if !n.type_arguments.is_empty() {
            self.program.push_op_at(Op::Instantiate, n.span);
            self.program.push_u16(n.type_arguments.len() as u16);
        }

        for argument in &n.arguments {
            self.handle(argument)?;
        }

        self.program.push_op_at(Op::CallExpression, n.span);
        self.program.push_u16(n.arguments.len() as u16);
        Ok(())
    }

    pub(super) fn lower_object_literal(
        &mut self,
        n: &ObjectLiteralExpression,
    ) -> Result<(), CompileError> {
        self.program.push_frame();
        for property in &n.properties {
            self.handle(property)?;
        }
        self.program.push_op_at(Op::ObjectLiteral, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }

    pub(super) fn lower_array_literal(
        &mut self,
        n: &ArrayLiteralExpression,
    ) -> Result<(), CompileError> {
        self.program.push_frame();
        for element in &n.elements {
            self.handle(element)?;
            self.program.push_op_at(Op::TupleMember, element.span());
        }
        self.program.push_op_at(Op::Tuple, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }

    /// The condition does not narrow anything here — the result is always
    /// the union of both branch types.
    pub(super) fn lower_conditional_expression(
        &mut self,
        n: &ConditionalExpression,
    ) -> Result<(), CompileError> {
        self.program.push_frame();
        self.handle(&n.when_false)?;
        self.handle(&n.when_true)?;
        self.program.push_op_at(Op::Union, n.span);
        self.program.pop_frame_implicit();
        Ok(())
    }

    /// `x = expr` re-types the variable's routine; nothing else is lowered.
    pub(super) fn lower_binary_expression(
        &mut self,
        n: &BinaryExpression,
    ) -> Result<(), CompileError> {
        match n.operator_token.kind {
            BinaryOperatorKind::Equals => {
                let Some(id) = n.left.as_identifier() else {
                    return Err(CompileError::UnsupportedAssignmentTarget);
                };

                let Some(symbol_id) = self.program.find_symbol(&id.escaped_text) else {
                    self.program.push_op_at(Op::Never, id.span);
                    self.program.push_error(ErrorCode::CannotFind, id.span);
                    return Ok(());
                };

                let routine = self
                    .program
                    .symbol(symbol_id)
                    .routine
                    .ok_or_else(|| CompileError::MissingRoutine(id.escaped_text.clone()))?;

                self.handle(&n.right)?;
                self.program.push_op_at(Op::Set, n.operator_token.span);
                self.program.push_address(routine);
                Ok(())
            }
            kind => Err(CompileError::UnsupportedOperator(kind)),
        }
    }
}

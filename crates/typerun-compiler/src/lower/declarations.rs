//! Lowering of declarations.
//!
//! Every named type-producing declaration registers a symbol that owns a
//! subroutine; the symbol (and its routine index) exists before the body is
//! compiled, so self- and forward references resolve.

use log::debug;
use typerun_bytecode::Op;

use crate::ast::{
    FunctionDeclaration, HeritageToken, InterfaceDeclaration, ParameterDeclaration,
    PropertyAssignment, PropertySignature, TypeAliasDeclaration, TypeParameterDeclaration,
    VariableDeclaration,
};
use crate::error::CompileError;
use crate::program::SymbolKind;

use super::Compiler;

impl Compiler {
    pub(super) fn lower_type_alias(&mut self, n: &TypeAliasDeclaration) -> Result<(), CompileError> {
        let symbol =
            self.program
                .push_symbol_for_routine(&n.name.escaped_text, SymbolKind::Type, n.span);
        if self.program.symbol(symbol).declarations > 1 {
            // TODO: embed a duplicate-declaration error once the VM defines
            // a code for it; until then the second body is skipped.
            return Ok(());
        }

        self.program.push_subroutine(&n.name.escaped_text)?;
        // Without type parameters the result is stored on the routine, so
        // tail calls must not escape it.
        if n.type_parameters.is_empty() {
            self.program.block_tail_call();
        }

        for parameter in &n.type_parameters {
            self.handle(parameter)?;
        }

        self.handle(&n.ty)?;
        self.program.pop_subroutine()?;
        Ok(())
    }

    pub(super) fn lower_type_parameter(
        &mut self,
        n: &TypeParameterDeclaration,
    ) -> Result<(), CompileError> {
        self.program
            .push_symbol(&n.name.escaped_text, SymbolKind::TypeArgument, n.span, None);

        if let Some(default) = &n.default_type {
            self.program.push_subroutine_nameless();
            self.handle(default)?;
            let routine = self.program.pop_subroutine()?;
            self.program.push_op_at(Op::TypeArgumentDefault, n.name.span);
            self.program.push_address(routine);
        } else {
            self.program.push_op_at(Op::TypeArgument, n.name.span);
        }
        // TODO: lower `constraint` once the VM checks it.
        Ok(())
    }

    pub(super) fn lower_function_declaration(
        &mut self,
        n: &FunctionDeclaration,
    ) -> Result<(), CompileError> {
        let Some(id) = &n.name else {
            debug!("function declaration without identifier name");
            return Ok(());
        };

        let symbol =
            self.program
                .push_symbol_for_routine(&id.escaped_text, SymbolKind::Function, id.span);
        if self.program.symbol(symbol).declarations > 1 {
            return Ok(());
        }

        if !n.type_parameters.is_empty() {
            // With type parameters the declaration yields a FunctionRef; the
            // VM instantiates the inner routine before calling it.
            self.program.push_subroutine(&id.escaped_text)?;
            let inner = self.program.push_subroutine_nameless();

            for parameter in &n.type_parameters {
                self.handle(parameter)?;
            }
            for parameter in &n.parameters {
                self.handle(parameter)?;
            }
            self.lower_return_type(n)?;
            self.program.push_op_at(Op::Function, n.span);
            self.program.pop_subroutine()?;

            self.program.push_op_at(Op::FunctionRef, n.span);
            self.program.push_address(inner);
            self.program.pop_subroutine()?;
        } else {
            self.program.push_subroutine(&id.escaped_text)?;
            for parameter in &n.parameters {
                self.handle(parameter)?;
            }
            self.lower_return_type(n)?;
            self.program.push_op_at(Op::Function, n.span);
            self.program.pop_subroutine()?;
        }
        Ok(())
    }

    fn lower_return_type(&mut self, n: &FunctionDeclaration) -> Result<(), CompileError> {
        match &n.ty {
            Some(ty) => self.handle(ty)?,
            // No inference from the body in this core.
            None => self.program.push_op(Op::Unknown),
        }
        Ok(())
    }

    pub(super) fn lower_parameter(&mut self, n: &ParameterDeclaration) -> Result<(), CompileError> {
        match &n.ty {
            Some(ty) => self.handle(ty)?,
            None => self.program.push_op_at(Op::Unknown, n.span),
        }

        self.program.push_op_at(Op::Parameter, n.span);
        match n.name.as_identifier() {
            Some(id) => self.program.push_storage(&id.escaped_text),
            None => self.program.push_storage(""),
        }

        if let Some(question) = n.question_token {
            self.program.push_op_at(Op::Optional, question);
        }
        if let Some(initializer) = &n.initializer {
            self.handle(initializer)?;
            self.program.push_op_at(Op::Initializer, initializer.span());
        }
        Ok(())
    }

    pub(super) fn lower_interface(&mut self, n: &InterfaceDeclaration) -> Result<(), CompileError> {
        let symbol =
            self.program
                .push_symbol_for_routine(&n.name.escaped_text, SymbolKind::Type, n.name.span);
        if self.program.symbol(symbol).declarations > 1 {
            return Ok(());
        }

        self.program.push_subroutine(&n.name.escaped_text)?;
        self.program.block_tail_call();
        self.program.push_frame();

        // Extend expressions first, own members after.
        for clause in &n.heritage_clauses {
            if clause.token == HeritageToken::Extends {
                for ty in &clause.types {
                    self.handle(ty)?;
                }
            }
        }

        for member in &n.members {
            self.handle(member)?;
        }

        self.program.push_op_at(Op::ObjectLiteral, n.name.span);
        self.program.pop_frame_implicit();
        self.program.pop_subroutine()?;
        Ok(())
    }

    pub(super) fn lower_property_signature(
        &mut self,
        n: &PropertySignature,
    ) -> Result<(), CompileError> {
        match &n.ty {
            Some(ty) => self.handle(ty)?,
            None => self.program.push_op(Op::Any),
        }

        match n.name.as_identifier() {
            Some(id) => self.program.push_string_literal(&id.escaped_text, id.span),
            // Computed name like `[a]: string`.
            None => self.handle(&n.name)?,
        }

        self.program.push_op_at(Op::PropertySignature, n.span);
        if n.question_token.is_some() {
            self.program.push_op(Op::Optional);
        }
        if n.readonly {
            self.program.push_op(Op::Readonly);
        }
        Ok(())
    }

    pub(super) fn lower_property_assignment(
        &mut self,
        n: &PropertyAssignment,
    ) -> Result<(), CompileError> {
        match &n.initializer {
            Some(initializer) => self.handle(initializer)?,
            None => self.program.push_op_at(Op::Any, n.span),
        }

        match n.name.as_identifier() {
            Some(id) => self.program.push_string_literal(&id.escaped_text, id.span),
            None => self.handle(&n.name)?,
        }

        self.program.push_op_at(Op::PropertySignature, n.name.span());
        if n.question_token.is_some() {
            self.program.push_op(Op::Optional);
        }
        if n.readonly {
            self.program.push_op(Op::Readonly);
        }
        Ok(())
    }

    pub(super) fn lower_variable_declaration(
        &mut self,
        n: &VariableDeclaration,
    ) -> Result<(), CompileError> {
        let Some(id) = n.name.as_identifier() else {
            debug!("variable declaration without identifier name");
            return Ok(());
        };
        let name = &id.escaped_text;
        let name_span = id.span;

        let symbol = self
            .program
            .push_symbol_for_routine(name, SymbolKind::Variable, name_span);
        if self.program.symbol(symbol).declarations > 1 {
            return Ok(());
        }

        if let Some(ty) = &n.ty {
            let routine = self.program.push_subroutine(name)?;
            // The declared type is stored on the routine, not tail-returned.
            self.program.block_tail_call();
            self.handle(ty)?;
            self.program.pop_subroutine()?;

            if let Some(initializer) = &n.initializer {
                self.handle(initializer)?;
                self.program.push_op(Op::Call);
                self.program.push_address(routine);
                self.program.push_u16(0);
                self.program.push_op_at(Op::Assign, name_span);
            }
        } else {
            let routine = self.program.push_subroutine(name)?;

            if let Some(initializer) = &n.initializer {
                self.handle(initializer)?;
                // `let x = true` widens to boolean; `const x = true` stays true.
                if !n.is_const() {
                    self.program.push_op(Op::Widen);
                }
                self.program.pop_subroutine()?;

                if !n.is_const() {
                    // Track the narrowed type of the initial assignment.
                    self.handle(initializer)?;
                    self.program.push_op(Op::Set);
                    self.program.push_address(routine);
                }
            } else {
                self.program.push_op(Op::Any);
                self.program.pop_subroutine()?;
            }
        }
        Ok(())
    }
}

//! AST lowering.
//!
//! A structural dispatch over the input tree: every node kind maps to a
//! fixed sequence of op emissions into the current target (the active
//! subroutine, or main). Split by concern:
//! - `types` — type expressions (unions, tuples, templates, members)
//! - `declarations` — aliases, interfaces, functions, variables
//! - `conditional` — conditional types, including distribution
//! - `expressions` — value expressions and identifier references

mod conditional;
mod declarations;
mod expressions;
mod types;


use log::debug;
use typerun_bytecode::Op;

use crate::ast::{Node, SourceFile};
use crate::error::CompileError;
use crate::program::Program;

pub struct Compiler {
    pub(crate) program: Program,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            program: Program::new(),
        }
    }

    /// Compile one source file into a program ready for `emit::build`.
    pub fn compile_source_file(file: &SourceFile) -> Result<Program, CompileError> {
        let mut compiler = Compiler::new();
        for statement in &file.statements {
            compiler.handle(statement)?;
        }
        Ok(compiler.program)
    }

    pub(crate) fn handle(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::SourceFile(n) => {
                for statement in &n.statements {
                    self.handle(statement)?;
                }
            }

            Node::AnyKeyword(s) => self.program.push_op_at(Op::Any, *s),
            Node::NullKeyword(s) => self.program.push_op_at(Op::Null, *s),
            Node::UndefinedKeyword(s) => self.program.push_op_at(Op::Undefined, *s),
            Node::NeverKeyword(s) => self.program.push_op_at(Op::Never, *s),
            Node::BooleanKeyword(s) => self.program.push_op_at(Op::Boolean, *s),
            Node::StringKeyword(s) => self.program.push_op_at(Op::String, *s),
            Node::NumberKeyword(s) => self.program.push_op_at(Op::Number, *s),
            Node::TrueKeyword(s) => self.program.push_op_at(Op::True, *s),
            Node::FalseKeyword(s) => self.program.push_op_at(Op::False, *s),

            Node::StringLiteral(lit) => {
                self.program.push_op_at(Op::StringLiteral, lit.span);
                self.program.push_storage(&lit.text);
            }
            Node::NumericLiteral(lit) => {
                self.program.push_op_at(Op::NumberLiteral, lit.span);
                self.program.push_storage(&lit.text);
            }
            Node::BigIntLiteral(lit) => {
                self.program.push_op_at(Op::BigIntLiteral, lit.span);
                self.program.push_storage(&lit.text);
            }
            Node::LiteralType(n) => self.handle(&n.literal)?,

            Node::TemplateLiteralType(n) => self.lower_template_literal_type(n)?,
            Node::UnionType(n) => self.lower_union_type(n)?,
            Node::IndexedAccessType(n) => self.lower_indexed_access_type(n)?,
            Node::TypeReference(n) => self.lower_type_reference(n)?,
            Node::TypeLiteral(n) => self.lower_type_literal(n)?,
            Node::RestType(n) => self.lower_rest_type(n)?,
            Node::ArrayType(n) => self.lower_array_type(n)?,
            Node::TupleType(n) => self.lower_tuple_type(n)?,
            Node::ConditionalType(n) => self.lower_conditional_type(n)?,
            Node::ParenthesizedType(n) | Node::ParenthesizedExpression(n) => {
                self.handle(&n.expression)?;
            }

            Node::TypeAliasDeclaration(n) => self.lower_type_alias(n)?,
            Node::TypeParameter(n) => self.lower_type_parameter(n)?,
            Node::FunctionDeclaration(n) => self.lower_function_declaration(n)?,
            Node::Parameter(n) => self.lower_parameter(n)?,
            Node::InterfaceDeclaration(n) => self.lower_interface(n)?,
            Node::PropertyAssignment(n) => self.lower_property_assignment(n)?,
            Node::PropertySignature(n) => self.lower_property_signature(n)?,
            Node::VariableStatement(n) => {
                for declaration in &n.declarations {
                    self.handle(declaration)?;
                }
            }
            Node::VariableDeclaration(n) => self.lower_variable_declaration(n)?,

            Node::Identifier(n) => self.lower_identifier(n)?,
            Node::ExpressionWithTypeArguments(n) => {
                self.lower_expression_with_type_arguments(n)?;
            }
            Node::ObjectLiteralExpression(n) => self.lower_object_literal(n)?,
            Node::ArrayLiteralExpression(n) => self.lower_array_literal(n)?,
            Node::CallExpression(n) => self.lower_call_expression(n)?,
            Node::ExpressionStatement(n) => self.handle(&n.expression)?,
            Node::ConditionalExpression(n) => self.lower_conditional_expression(n)?,
            Node::BinaryExpression(n) => self.lower_binary_expression(n)?,

            // Only meaningful inside a tuple type, where the tuple lowering
            // matches them directly.
            Node::NamedTupleMember(_) | Node::OptionalType(_) => {
                debug!("tuple member node outside a tuple type not handled");
            }

            Node::Unknown(n) => {
                debug!("node kind `{}` not handled", n.kind);
            }
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

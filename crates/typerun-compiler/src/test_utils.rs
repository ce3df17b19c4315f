//! Construction helpers for tests.
//!
//! The parser is an external collaborator, so tests build ASTs directly.
//! Builders default to zero spans; nodes whose spans matter to a test are
//! constructed by hand.

use typerun_bytecode::{Op, visit_ops};

use crate::ast::*;
use crate::lower::Compiler;
use crate::program::{Program, Subroutine};

pub fn source_file(statements: Vec<Node>) -> SourceFile {
    SourceFile {
        statements,
        span: Span::default(),
    }
}

/// Compile statements, panicking on fatal errors.
pub fn compile(statements: Vec<Node>) -> Program {
    Compiler::compile_source_file(&source_file(statements)).unwrap()
}

/// The opcodes of a buffer, parameters skipped.
pub fn ops_in(buf: &[u8]) -> Vec<Op> {
    let mut ops = Vec::new();
    visit_ops(buf, |_, op| ops.push(op));
    ops
}

/// The opcodes of a subroutine, parameters skipped.
pub fn ops_of(routine: &Subroutine) -> Vec<Op> {
    ops_in(routine.ops())
}

/// The ip of the `index`-th occurrence of `op` in a buffer.
pub fn ip_of(buf: &[u8], op: Op, index: usize) -> u32 {
    let mut found = Vec::new();
    visit_ops(buf, |ip, o| {
        if o == op {
            found.push(ip as u32);
        }
    });
    found[index]
}

pub fn ident(text: &str) -> Identifier {
    Identifier {
        escaped_text: text.to_owned(),
        type_arguments: Vec::new(),
        span: Span::default(),
    }
}

pub fn ident_node(text: &str) -> Node {
    Node::Identifier(ident(text))
}

pub fn any_kw() -> Node {
    Node::AnyKeyword(Span::default())
}

pub fn string_kw() -> Node {
    Node::StringKeyword(Span::default())
}

pub fn number_kw() -> Node {
    Node::NumberKeyword(Span::default())
}

pub fn never_kw() -> Node {
    Node::NeverKeyword(Span::default())
}

pub fn str_lit(text: &str) -> Node {
    Node::StringLiteral(Literal {
        text: text.to_owned(),
        span: Span::default(),
    })
}

pub fn num_lit(text: &str) -> Node {
    Node::NumericLiteral(Literal {
        text: text.to_owned(),
        span: Span::default(),
    })
}

pub fn lit_type(literal: Node) -> Node {
    Node::LiteralType(Box::new(LiteralType {
        literal,
        span: Span::default(),
    }))
}

pub fn union(types: Vec<Node>) -> Node {
    Node::UnionType(Box::new(UnionType {
        types,
        span: Span::default(),
    }))
}

pub fn ty_ref(name: &str) -> Node {
    ty_ref_args(name, Vec::new())
}

pub fn ty_ref_args(name: &str, type_arguments: Vec<Node>) -> Node {
    Node::TypeReference(Box::new(TypeReference {
        type_name: ident(name),
        type_arguments,
        span: Span::default(),
    }))
}

pub fn alias(name: &str, type_parameters: Vec<Node>, ty: Node) -> Node {
    Node::TypeAliasDeclaration(Box::new(TypeAliasDeclaration {
        name: ident(name),
        type_parameters,
        ty,
        span: Span::default(),
    }))
}

pub fn type_param(name: &str) -> Node {
    Node::TypeParameter(Box::new(TypeParameterDeclaration {
        name: ident(name),
        constraint: None,
        default_type: None,
        span: Span::default(),
    }))
}

pub fn type_param_default(name: &str, default_type: Node) -> Node {
    Node::TypeParameter(Box::new(TypeParameterDeclaration {
        name: ident(name),
        constraint: None,
        default_type: Some(default_type),
        span: Span::default(),
    }))
}

pub fn tuple(elements: Vec<Node>) -> Node {
    Node::TupleType(Box::new(TupleType {
        elements,
        span: Span::default(),
    }))
}

pub fn rest_type(ty: Node) -> Node {
    Node::RestType(Box::new(RestType {
        ty,
        span: Span::default(),
    }))
}

pub fn array_type(element_type: Node) -> Node {
    Node::ArrayType(Box::new(ArrayType {
        element_type,
        span: Span::default(),
    }))
}

pub fn optional_type(ty: Node) -> Node {
    Node::OptionalType(Box::new(OptionalType {
        ty,
        span: Span::default(),
    }))
}

pub fn named_tuple_member(name: &str, ty: Node, rest: bool, optional: bool) -> Node {
    Node::NamedTupleMember(Box::new(NamedTupleMember {
        name: ident(name),
        ty,
        dot_dot_dot_token: rest.then(Span::default),
        question_token: optional.then(Span::default),
        span: Span::default(),
    }))
}

pub fn cond_type(check: Node, extends: Node, when_true: Node, when_false: Node) -> Node {
    Node::ConditionalType(Box::new(ConditionalTypeNode {
        check_type: check,
        extends_type: extends,
        true_type: when_true,
        false_type: when_false,
        span: Span::default(),
    }))
}

pub fn indexed_access(object: Node, index: Node) -> Node {
    Node::IndexedAccessType(Box::new(IndexedAccessType {
        object_type: object,
        index_type: index,
        span: Span::default(),
    }))
}

pub fn template_literal(head: &str, spans: Vec<(Node, &str)>) -> Node {
    let template_spans = spans
        .into_iter()
        .map(|(ty, text)| TemplateLiteralSpan {
            ty,
            literal: TemplateText {
                raw_text: Some(text.to_owned()),
                span: Span::default(),
            },
            span: Span::default(),
        })
        .collect();
    Node::TemplateLiteralType(Box::new(TemplateLiteralType {
        head: TemplateText {
            raw_text: Some(head.to_owned()),
            span: Span::default(),
        },
        template_spans,
        span: Span::default(),
    }))
}

pub fn type_literal(members: Vec<Node>) -> Node {
    Node::TypeLiteral(Box::new(TypeLiteral {
        members,
        span: Span::default(),
    }))
}

pub fn prop_sig(name: &str, ty: Node) -> Node {
    prop_sig_full(name, ty, false, false)
}

pub fn prop_sig_full(name: &str, ty: Node, optional: bool, readonly: bool) -> Node {
    Node::PropertySignature(Box::new(PropertySignature {
        name: ident_node(name),
        ty: Some(ty),
        question_token: optional.then(Span::default),
        readonly,
        span: Span::default(),
    }))
}

pub fn interface(name: &str, extends: Vec<Node>, members: Vec<Node>) -> Node {
    let heritage_clauses = if extends.is_empty() {
        Vec::new()
    } else {
        vec![HeritageClause {
            token: HeritageToken::Extends,
            types: extends,
            span: Span::default(),
        }]
    };
    Node::InterfaceDeclaration(Box::new(InterfaceDeclaration {
        name: ident(name),
        heritage_clauses,
        members,
        span: Span::default(),
    }))
}

pub fn heritage_ref(name: &str) -> Node {
    Node::ExpressionWithTypeArguments(Box::new(ExpressionWithTypeArguments {
        expression: ident_node(name),
        type_arguments: Vec::new(),
        span: Span::default(),
    }))
}

pub fn func(name: &str, type_parameters: Vec<Node>, parameters: Vec<Node>, ty: Option<Node>) -> Node {
    Node::FunctionDeclaration(Box::new(FunctionDeclaration {
        name: Some(ident(name)),
        type_parameters,
        parameters,
        ty,
        span: Span::default(),
    }))
}

pub fn param(name: &str, ty: Option<Node>) -> Node {
    Node::Parameter(Box::new(ParameterDeclaration {
        name: ident_node(name),
        ty,
        question_token: None,
        initializer: None,
        span: Span::default(),
    }))
}

pub fn var_decl(name: &str, ty: Option<Node>, initializer: Option<Node>, is_const: bool) -> Node {
    Node::VariableDeclaration(Box::new(VariableDeclaration {
        name: ident_node(name),
        ty,
        initializer,
        is_const,
        span: Span::default(),
    }))
}

pub fn var_stmt(declarations: Vec<Node>) -> Node {
    Node::VariableStatement(Box::new(VariableStatement {
        declarations,
        span: Span::default(),
    }))
}

pub fn expr_stmt(expression: Node) -> Node {
    Node::ExpressionStatement(Box::new(ExpressionStatement {
        expression,
        span: Span::default(),
    }))
}

pub fn call_expr(callee: Node, type_arguments: Vec<Node>, arguments: Vec<Node>) -> Node {
    Node::CallExpression(Box::new(CallExpression {
        expression: callee,
        type_arguments,
        arguments,
        span: Span::default(),
    }))
}

pub fn assign(name: &str, right: Node) -> Node {
    binary(ident_node(name), BinaryOperatorKind::Equals, right)
}

pub fn binary(left: Node, kind: BinaryOperatorKind, right: Node) -> Node {
    Node::BinaryExpression(Box::new(BinaryExpression {
        left,
        operator_token: OperatorToken {
            kind,
            span: Span::default(),
        },
        right,
        span: Span::default(),
    }))
}

pub fn unknown(kind: &str) -> Node {
    Node::Unknown(UnknownNode {
        kind: kind.to_owned(),
        span: Span::default(),
    })
}

//! Node kinds of the annotated Squirrel syntax tree

use std::fmt;

/// Grammar production a node was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // ============ Structure ============
    /// Whole source file
    Program,
    /// `{ statement* }`
    Block,
    /// Any statement without a dedicated kind (`if`, `while`, `return`, ...)
    Statement,

    // ============ Declarations ============
    /// `local a: T = e, b;`
    LocalDeclStatement,
    /// One declarator of a `local` statement
    LocalDecl,
    /// `function name(params): T { ... }`
    FunctionStatement,
    /// `class Name extends Base { ... }`
    ClassStatement,
    /// `extends Base`
    Extends,
    /// `{ member* }` of a class
    ClassBody,
    /// `name: T = e;` inside a class body
    FieldDecl,
    /// `constructor(params) { ... }`
    ConstructorDecl,
    /// `function name(params): T { ... }` inside a class body
    MethodDecl,
    /// `( parameter, ... )`
    ParameterList,
    /// `name: T = default`
    Parameter,
    /// The `...` rest-parameters marker
    VarParams,
    /// `: T`
    TypeAnnotation,
    /// The type part of an annotation
    Type,

    // ============ Expressions ============
    Expression,
    /// `function(params): T { ... }` used as a value
    FunctionExpression,
    /// `class extends Base { ... }` used as a value
    ClassExpression,

    // ============ Leaves ============
    Identifier,
    /// Keyword, punctuation or literal token
    Token,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

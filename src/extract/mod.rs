//! Declaration extraction
//!
//! Walks a parse tree once, depth first, and records every local, field,
//! free function, method and constructor declaration with its annotation
//! text, default value, location and scope path.
//!
//! Nested declarations are tracked with stacks: a function statement inside
//! a method, or a class inside a function, restores the enclosing context
//! when it is left.

use log::{debug, trace, warn};

use crate::frontend::parse_source;
use crate::symbols::{Class, ExtractionResult, Function, Location, Variable, GLOBAL_SCOPE};
use crate::syntax::{walk, Listener, NodeKind, ParseTree};
use crate::types::VARARGS_MARKER;
use crate::utils::{Error, Result};

/// Scope name pushed for constructor bodies
const CONSTRUCTOR_SCOPE: &str = "constructor";

/// What a declaration node opened on enter, undone on exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Function,
    Class,
    /// Unnamed class expression; its members are not recorded
    AnonymousClass,
    Member,
    /// Member declaration found outside any class; nothing was opened
    Dropped,
}

/// Where a function record lives in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionSlot {
    Free(usize),
    Method { class: usize, index: usize },
    Constructor { class: usize },
}

// ==================== Extractor ====================

/// Listener that builds the symbol tables of one extraction run
#[derive(Debug)]
pub struct TypeExtractor {
    scope: Vec<String>,
    variables: Vec<Variable>,
    functions: Vec<Function>,
    classes: Vec<Class>,
    /// `None` marks an unnamed class expression
    class_stack: Vec<Option<usize>>,
    function_stack: Vec<FunctionSlot>,
    frames: Vec<Frame>,
}

impl Default for TypeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeExtractor {
    pub fn new() -> Self {
        Self {
            scope: vec![GLOBAL_SCOPE.to_string()],
            variables: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            class_stack: Vec::new(),
            function_stack: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Dot-joined names of the open scopes
    pub fn scope_path(&self) -> String {
        self.scope.join(".")
    }

    /// Innermost class being declared
    pub fn current_class(&self) -> Option<&Class> {
        self.innermost_class().map(|idx| &self.classes[idx])
    }

    /// Innermost function, method or constructor being declared
    pub fn current_function(&self) -> Option<&Function> {
        match *self.function_stack.last()? {
            FunctionSlot::Free(idx) => self.functions.get(idx),
            FunctionSlot::Method { class, index } => self.classes[class].methods.get(index),
            FunctionSlot::Constructor { class } => self.classes[class].constructor.as_ref(),
        }
    }

    /// Consume the extractor, producing a successful result
    pub fn finish(self) -> ExtractionResult {
        debug!(
            "extracted {} variables, {} functions, {} classes",
            self.variables.len(),
            self.functions.len(),
            self.classes.len()
        );
        ExtractionResult::success(self.variables, self.functions, self.classes)
    }

    fn innermost_class(&self) -> Option<usize> {
        self.class_stack.last().copied().flatten()
    }

    fn nested_path(&self, name: &str) -> String {
        format!("{}.{}", self.scope_path(), name)
    }

    // ==================== Declarations ====================

    fn record_local<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let name = identifier(decl)?;
        let variable = Variable {
            name,
            declared_type: extract_type_annotation(decl.child(NodeKind::TypeAnnotation)),
            location: location(decl),
            scope_path: self.scope_path(),
            is_parameter: false,
            is_field: false,
            is_local: true,
            default_value: decl.child(NodeKind::Expression).map(|e| e.text()),
        };
        trace!("local {}: {} in {}", variable.name, variable.type_display(), variable.scope_path);
        self.variables.push(variable);
        Ok(())
    }

    fn enter_function<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let name = identifier(decl)?;
        let function = self.build_function(decl, name.clone(), true)?;
        debug!("function {}", function.signature());

        self.function_stack.push(FunctionSlot::Free(self.functions.len()));
        self.functions.push(function);
        self.scope.push(name);
        self.frames.push(Frame::Function);
        Ok(())
    }

    fn enter_class<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let name = identifier(decl)?;
        let base_class = decl
            .child(NodeKind::Extends)
            .and_then(|extends| extends.child(NodeKind::Expression))
            .or_else(|| decl.child(NodeKind::Expression))
            .map(|base| base.text());
        debug!("class {} (base: {:?})", name, base_class);

        self.class_stack.push(Some(self.classes.len()));
        self.classes.push(Class::new(name.clone(), base_class, location(decl)));
        self.scope.push(name);
        self.frames.push(Frame::Class);
        Ok(())
    }

    fn record_field<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let Some(class) = self.innermost_class() else {
            debug!("dropping field declaration outside a class at {}", decl.start());
            return Ok(());
        };

        let field = Variable {
            name: identifier(decl)?,
            declared_type: extract_type_annotation(decl.child(NodeKind::TypeAnnotation)),
            location: location(decl),
            scope_path: self.scope_path(),
            is_parameter: false,
            is_field: true,
            is_local: false,
            default_value: decl.child(NodeKind::Expression).map(|e| e.text()),
        };
        trace!("field {}.{}: {}", self.classes[class].name, field.name, field.type_display());

        self.classes[class].fields.push(field.clone());
        self.variables.push(field);
        Ok(())
    }

    fn enter_constructor<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let Some(class) = self.innermost_class() else {
            debug!("dropping constructor outside a class at {}", decl.start());
            self.frames.push(Frame::Dropped);
            return Ok(());
        };

        if decl.has_child(NodeKind::TypeAnnotation) {
            trace!("ignoring return annotation on constructor of {}", self.classes[class].name);
        }
        let constructor = self.build_function(decl, CONSTRUCTOR_SCOPE.to_string(), false)?;

        self.classes[class].constructor = Some(constructor);
        self.function_stack.push(FunctionSlot::Constructor { class });
        self.scope.push(CONSTRUCTOR_SCOPE.to_string());
        self.frames.push(Frame::Member);
        Ok(())
    }

    fn enter_method<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let Some(class) = self.innermost_class() else {
            debug!("dropping method outside a class at {}", decl.start());
            self.frames.push(Frame::Dropped);
            return Ok(());
        };

        let name = identifier(decl)?;
        let method = self.build_function(decl, name.clone(), true)?;
        trace!("method {}.{}", self.classes[class].name, method.signature());

        let index = self.classes[class].methods.len();
        self.classes[class].methods.push(method);
        self.function_stack.push(FunctionSlot::Method { class, index });
        self.scope.push(name);
        self.frames.push(Frame::Member);
        Ok(())
    }

    /// Build the record before the body is visited, so the signature is complete
    fn build_function<T: ParseTree>(&self, decl: &T, name: String, with_return: bool) -> Result<Function> {
        let scope_path = self.nested_path(&name);
        let parameters = extract_parameters(decl, &scope_path)?;
        let return_type = if with_return {
            extract_type_annotation(decl.child(NodeKind::TypeAnnotation))
        } else {
            None
        };

        Ok(Function {
            name,
            parameters,
            return_type,
            location: location(decl),
            scope_path,
        })
    }

    fn leave<T: ParseTree>(&mut self, decl: &T) -> Result<()> {
        let frame = self.frames.pop().ok_or_else(|| Error::MalformedNode {
            kind: decl.kind().to_string(),
            missing: "matching enter",
            position: decl.start(),
        })?;

        match frame {
            Frame::Function | Frame::Member => {
                self.scope.pop();
                self.function_stack.pop();
            }
            Frame::Class => {
                self.scope.pop();
                self.class_stack.pop();
            }
            Frame::AnonymousClass => {
                self.class_stack.pop();
            }
            Frame::Dropped => {}
        }
        Ok(())
    }
}

impl<T: ParseTree> Listener<T> for TypeExtractor {
    fn enter(&mut self, node: &T) -> Result<()> {
        match node.kind() {
            NodeKind::LocalDecl => self.record_local(node),
            NodeKind::FunctionStatement => self.enter_function(node),
            NodeKind::ClassStatement => self.enter_class(node),
            NodeKind::ClassExpression => {
                debug!("skipping members of unnamed class at {}", node.start());
                self.class_stack.push(None);
                self.frames.push(Frame::AnonymousClass);
                Ok(())
            }
            NodeKind::FieldDecl => self.record_field(node),
            NodeKind::ConstructorDecl => self.enter_constructor(node),
            NodeKind::MethodDecl => self.enter_method(node),
            _ => Ok(()),
        }
    }

    fn exit(&mut self, node: &T) -> Result<()> {
        match node.kind() {
            NodeKind::FunctionStatement
            | NodeKind::ClassStatement
            | NodeKind::ClassExpression
            | NodeKind::ConstructorDecl
            | NodeKind::MethodDecl => self.leave(node),
            _ => Ok(()),
        }
    }
}

// ==================== Helpers ====================

fn location<T: ParseTree>(node: &T) -> Location {
    node.start()
}

fn identifier<T: ParseTree>(node: &T) -> Result<String> {
    node.child(NodeKind::Identifier)
        .map(|ident| ident.text())
        .ok_or_else(|| Error::MalformedNode {
            kind: node.kind().to_string(),
            missing: "identifier",
            position: node.start(),
        })
}

/// Text of the type inside a `: T` annotation node, if there is one
pub fn extract_type_annotation<T: ParseTree>(annotation: Option<&T>) -> Option<String> {
    let annotation = annotation?;
    if let Some(ty) = annotation.child(NodeKind::Type) {
        return Some(ty.text());
    }
    let text = annotation.text();
    match text.strip_prefix(':') {
        Some(rest) => Some(rest.trim().to_string()),
        None => Some(text),
    }
}

/// Parameters of a function-like declaration, in declaration order
pub fn extract_parameters<T: ParseTree>(decl: &T, scope_path: &str) -> Result<Vec<Variable>> {
    let Some(list) = decl.child(NodeKind::ParameterList) else {
        return Ok(Vec::new());
    };

    list.children_of(NodeKind::Parameter)
        .map(|param| {
            if param.has_child(NodeKind::VarParams) {
                return Ok(Variable {
                    name: "...".to_string(),
                    declared_type: Some(VARARGS_MARKER.to_string()),
                    location: location(param),
                    scope_path: scope_path.to_string(),
                    is_parameter: true,
                    is_field: false,
                    is_local: false,
                    default_value: None,
                });
            }

            Ok(Variable {
                name: identifier(param)?,
                declared_type: extract_type_annotation(param.child(NodeKind::TypeAnnotation)),
                location: location(param),
                scope_path: scope_path.to_string(),
                is_parameter: true,
                is_field: false,
                is_local: false,
                default_value: param.child(NodeKind::Expression).map(|e| e.text()),
            })
        })
        .collect()
}

// ==================== Entry Points ====================

/// Extract declarations from a parse tree.
///
/// Never fails: a malformed tree yields `success: false` and no symbols.
pub fn extract<T: ParseTree>(tree: &T) -> ExtractionResult {
    let mut extractor = TypeExtractor::new();
    match walk(&mut extractor, tree) {
        Ok(()) => extractor.finish(),
        Err(err) => {
            warn!("extraction failed: {}", err);
            ExtractionResult::failure(err.to_string())
        }
    }
}

/// Parse source text and extract its declarations
pub fn extract_source(source: &str) -> ExtractionResult {
    match parse_source(source) {
        Ok(tree) => extract(&tree),
        Err(err) => {
            let message = match err.position() {
                Some(position) => format!("Parse error at {}: {}", position, err),
                None => format!("Parse error: {}", err),
            };
            warn!("{}", message);
            ExtractionResult::failure(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxNode;
    use crate::utils::Position;
    use pretty_assertions::assert_eq;

    fn tok(kind: NodeKind, text: &str, line: u32, column: u32) -> SyntaxNode {
        SyntaxNode::token(kind, text, Position::new(line, column))
    }

    #[test]
    fn test_top_level_local() {
        let result = extract_source("local x: int = 5;");
        assert!(result.success);
        assert_eq!(
            result.variables,
            vec![Variable {
                name: "x".to_string(),
                declared_type: Some("int".to_string()),
                location: Location::new(1, 6),
                scope_path: "global".to_string(),
                is_parameter: false,
                is_field: false,
                is_local: true,
                default_value: Some("5".to_string()),
            }]
        );
        assert!(result.functions.is_empty() && result.classes.is_empty());
    }

    #[test]
    fn test_class_with_members() {
        let source = r#"
class Student extends Person {
    studentId: string;

    constructor(name: string, id: string) {
        base.constructor(name);
        this.studentId = id;
    }

    function getAverage(): float {
        local sum: int = 0;
        return sum;
    }
}
"#;
        let result = extract_source(source);
        assert!(result.success, "{:?}", result.error);

        let class = result.class("Student").unwrap();
        assert_eq!(class.base_class.as_deref(), Some("Person"));
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].scope_path, "global.Student");
        assert!(class.fields[0].is_field);

        let constructor = class.constructor.as_ref().unwrap();
        assert_eq!(constructor.parameters.len(), 2);
        assert_eq!(constructor.parameters[1].scope_path, "global.Student.constructor");

        assert_eq!(class.methods.len(), 1);
        let method = &class.methods[0];
        assert_eq!(method.scope_path, "global.Student.getAverage");
        assert_eq!(method.return_type.as_deref(), Some("float"));

        let sum = result.variables.iter().find(|v| v.name == "sum").unwrap();
        assert_eq!(sum.scope_path, "global.Student.getAverage");
        // Methods are not free functions
        assert!(result.functions.is_empty());
    }

    #[test]
    fn test_field_outside_class_is_dropped() {
        let field = SyntaxNode::wrap(
            NodeKind::FieldDecl,
            vec![
                tok(NodeKind::Identifier, "stray", 1, 0),
                SyntaxNode::wrap(
                    NodeKind::TypeAnnotation,
                    vec![
                        tok(NodeKind::Token, ":", 1, 5),
                        SyntaxNode::wrap(NodeKind::Type, vec![tok(NodeKind::Identifier, "int", 1, 7)]),
                    ],
                ),
            ],
        );
        let program = SyntaxNode::node(NodeKind::Program, Position::new(1, 0), vec![field]);

        let result = extract(&program);
        assert!(result.success);
        assert!(result.variables.is_empty());
        assert!(result.classes.is_empty());
    }

    #[test]
    fn test_member_outside_class_is_dropped() {
        let method = SyntaxNode::wrap(
            NodeKind::MethodDecl,
            vec![
                tok(NodeKind::Token, "function", 1, 0),
                tok(NodeKind::Identifier, "m", 1, 9),
                SyntaxNode::wrap(
                    NodeKind::Block,
                    vec![
                        tok(NodeKind::Token, "{", 1, 12),
                        SyntaxNode::wrap(
                            NodeKind::LocalDecl,
                            vec![tok(NodeKind::Identifier, "inner", 1, 20)],
                        ),
                        tok(NodeKind::Token, "}", 1, 27),
                    ],
                ),
            ],
        );
        let constructor = SyntaxNode::wrap(
            NodeKind::ConstructorDecl,
            vec![tok(NodeKind::Token, "constructor", 2, 0)],
        );
        let program = SyntaxNode::node(NodeKind::Program, Position::new(1, 0), vec![method, constructor]);

        let result = extract(&program);
        assert!(result.success);
        assert!(result.functions.is_empty() && result.classes.is_empty());
        // The body is still walked, in the enclosing scope
        assert_eq!(result.variables.len(), 1);
        assert_eq!(result.variables[0].scope_path, "global");
    }

    #[test]
    fn test_parameters_and_varargs() {
        let result = extract_source("function calculate(x: int, y: int = 10, ...): float { return x + y; }");
        assert!(result.success);

        let function = result.function("calculate").unwrap();
        assert_eq!(function.scope_path, "global.calculate");
        assert_eq!(function.signature(), "calculate(x: int, y: int = 10, ...: varargs): float");

        let varargs = &function.parameters[2];
        assert!(varargs.is_varargs());
        assert_eq!(varargs.declared_type.as_deref(), Some(VARARGS_MARKER));
        assert_eq!(varargs.default_value, None);
        assert!(function.parameters.iter().all(|p| p.is_parameter && !p.is_local));
        // Parameters are not listed as variables
        assert!(result.variables.is_empty());
    }

    #[test]
    fn test_constructor_return_annotation_ignored() {
        let result = extract_source("class A { constructor(): int { } }");
        assert!(result.success);
        let constructor = result.classes[0].constructor.as_ref().unwrap();
        assert_eq!(constructor.name, "constructor");
        assert_eq!(constructor.return_type, None);
    }

    #[test]
    fn test_nested_declarations_restore_context() {
        let source = r#"
class Outer {
    function run() {
        function helper(a: int) {
            local deep = 1;
        }
        class Inner {
            value: int = 0;
        }
        local after: string = "x";
    }
    count: int = 0;
}
local top = null;
"#;
        let result = extract_source(source);
        assert!(result.success, "{:?}", result.error);

        let helper = result.function("helper").unwrap();
        assert_eq!(helper.scope_path, "global.Outer.run.helper");

        let scopes: Vec<(&str, &str)> = result
            .variables
            .iter()
            .map(|v| (v.name.as_str(), v.scope_path.as_str()))
            .collect();
        assert_eq!(
            scopes,
            vec![
                ("deep", "global.Outer.run.helper"),
                ("value", "global.Outer.run.Inner"),
                ("after", "global.Outer.run"),
                ("count", "global.Outer"),
                ("top", "global"),
            ]
        );

        // Fields land on the innermost open class
        assert_eq!(result.class("Inner").unwrap().fields.len(), 1);
        assert_eq!(result.class("Outer").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_locations() {
        let result = extract_source("\nfunction f() {}\n  class C {\n    x = 1\n  }\n");
        assert_eq!(result.functions[0].location, Location::new(2, 0));
        assert_eq!(result.classes[0].location, Location::new(3, 2));
        assert_eq!(result.classes[0].fields[0].location, Location::new(4, 4));
        assert_eq!(result.classes[0].fields[0].declared_type, None);
    }

    #[test]
    fn test_extractor_state_while_walking() {
        struct Recorder {
            inner: TypeExtractor,
            seen: Vec<(String, Option<String>, Option<String>)>,
        }

        impl Listener<SyntaxNode> for Recorder {
            fn enter(&mut self, node: &SyntaxNode) -> Result<()> {
                self.inner.enter(node)?;
                if node.kind() == NodeKind::LocalDecl {
                    self.seen.push((
                        self.inner.scope_path(),
                        self.inner.current_class().map(|c| c.name.clone()),
                        self.inner.current_function().map(|f| f.name.clone()),
                    ));
                }
                Ok(())
            }

            fn exit(&mut self, node: &SyntaxNode) -> Result<()> {
                self.inner.exit(node)
            }
        }

        let tree = parse_source("class K { constructor() { local a; } } local b;").unwrap();
        let mut recorder = Recorder { inner: TypeExtractor::new(), seen: Vec::new() };
        walk(&mut recorder, &tree).unwrap();

        assert_eq!(
            recorder.seen,
            vec![
                ("global.K.constructor".to_string(), Some("K".to_string()), Some("constructor".to_string())),
                ("global".to_string(), None, None),
            ]
        );
    }

    #[test]
    fn test_malformed_tree_fails_without_symbols() {
        let program = SyntaxNode::node(
            NodeKind::Program,
            Position::new(1, 0),
            vec![
                SyntaxNode::wrap(NodeKind::LocalDecl, vec![tok(NodeKind::Identifier, "ok", 1, 6)]),
                SyntaxNode::wrap(NodeKind::LocalDecl, vec![tok(NodeKind::Token, "=", 2, 6)]),
            ],
        );

        let result = extract(&program);
        assert!(!result.success);
        assert!(result.variables.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("Malformed LocalDecl at 2:6: missing identifier")
        );
    }

    #[test]
    fn test_parse_error_becomes_failure() {
        let result = extract_source("local x: = 1");
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Parse error at 1:9"));
    }

    #[test]
    fn test_deep_nesting_is_a_parse_failure() {
        let depth = 10_000;
        let source = format!("local x = {}1{};", "(".repeat(depth), ")".repeat(depth));
        let result = extract_source(&source);
        assert!(!result.success);
        assert!(result.variables.is_empty());
        assert!(result.error.unwrap().ends_with("Nesting too deep"));

        let source = format!("local x: {}int{};", "array<".repeat(depth), ">".repeat(depth));
        assert!(!extract_source(&source).success);
    }

    #[test]
    fn test_declarations_inside_other_statements() {
        let source = r#"
enum Color { Red, Green = 2 }
const MAX = 10;
switch (mode) {
    case 1:
        local picked: int = 1;
        break;
    default:
        local fallback = null;
}
class Counter {
    static function create(): Counter { return Counter(); }
    function step() { yield 1; }
}
local Anon = class extends Counter {
    hidden: int = 0;
    function secret() { local inner = 1; }
};
"#;
        let result = extract_source(source);
        assert!(result.success, "{:?}", result.error);

        let names: Vec<(&str, &str)> = result
            .variables
            .iter()
            .map(|v| (v.name.as_str(), v.scope_path.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("picked", "global"),
                ("fallback", "global"),
                ("Anon", "global"),
                ("inner", "global"),
            ]
        );

        assert_eq!(result.classes.len(), 1);
        let counter = &result.classes[0];
        let methods: Vec<String> = counter.methods.iter().map(|m| m.signature()).collect();
        assert_eq!(methods, vec!["create(): Counter", "step(): void"]);
        assert_eq!(counter.methods[0].location, Location::new(12, 4));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let source = "class A { f = 1; function g(x) {} } function h(): int { local y: int = 2; }";
        assert_eq!(extract_source(source), extract_source(source));
    }
}

//! Type annotation parsing and resolution
//!
//! Annotation text as recorded by the extractor (`int`, `string?`,
//! `array<int>`, `table<string, float>`, `function<int, bool>`,
//! `int | null`, `Person`) is parsed into a small `TypeExpr` tree and then
//! resolved to a `Type` against the built-in names and the classes known
//! to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{ClassType, PrimitiveType, Type};
use crate::utils::{Error, Result};

/// Marker annotation the extractor attaches to `...` parameters
pub const VARARGS_MARKER: &str = "varargs";

/// Syntax of an annotation, before name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named { name: String, args: Vec<TypeExpr> },
    Optional(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

/// Parse annotation text
pub fn parse_annotation(text: &str) -> Result<TypeExpr> {
    let mut parser = AnnotationParser {
        text,
        chars: text.chars().collect(),
        pos: 0,
    };
    let expr = parser.parse_union()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.error(format!("unexpected '{}'", parser.chars[parser.pos])));
    }
    Ok(expr)
}

struct AnnotationParser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl AnnotationParser<'_> {
    fn error(&self, reason: String) -> Error {
        Error::InvalidAnnotation {
            text: self.text.to_string(),
            reason,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).map_or(false, |c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_union(&mut self) -> Result<TypeExpr> {
        let mut members = vec![self.parse_postfix()?];
        while self.consume('|') {
            members.push(self.parse_postfix()?);
        }
        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            TypeExpr::Union(members)
        })
    }

    fn parse_postfix(&mut self) -> Result<TypeExpr> {
        let mut expr = self.parse_primary()?;
        while self.consume('?') {
            expr = TypeExpr::Optional(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<TypeExpr> {
        if self.consume('(') {
            let inner = self.parse_union()?;
            if !self.consume(')') {
                return Err(self.error("expected ')'".to_string()));
            }
            return Ok(inner);
        }

        let name = self.parse_name()?;
        let mut args = Vec::new();
        if self.consume('<') {
            loop {
                args.push(self.parse_union()?);
                if self.consume(',') {
                    continue;
                }
                if self.consume('>') {
                    break;
                }
                return Err(self.error(format!("expected ',' or '>' in arguments of '{}'", name)));
            }
        }
        Ok(TypeExpr::Named { name, args })
    }

    fn parse_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(&c) = self.chars.get(self.pos) {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            let reason = match self.chars.get(self.pos) {
                Some(c) => format!("expected type name, got '{}'", c),
                None => "expected type name".to_string(),
            };
            return Err(self.error(reason));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

/// Outcome of resolving an annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub ty: Type,
    /// Names that matched neither a built-in nor a known class
    pub unknown_names: Vec<String>,
}

/// Resolves annotation syntax to types
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    classes: HashMap<String, Arc<ClassType>>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a class resolvable by name
    pub fn define_class(&mut self, class: Arc<ClassType>) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassType>> {
        self.classes.get(name)
    }

    /// Parse and resolve annotation text
    pub fn resolve_text(&self, text: &str) -> Result<Resolution> {
        if text == VARARGS_MARKER {
            return Ok(Resolution { ty: Type::ANY, unknown_names: Vec::new() });
        }
        let expr = parse_annotation(text)?;
        let mut unknown_names = Vec::new();
        let ty = self.resolve(&expr, text, &mut unknown_names)?;
        Ok(Resolution { ty, unknown_names })
    }

    fn resolve(&self, expr: &TypeExpr, text: &str, unknown: &mut Vec<String>) -> Result<Type> {
        match expr {
            TypeExpr::Optional(inner) => Ok(Type::optional(self.resolve(inner, text, unknown)?)),
            TypeExpr::Union(members) => {
                let members = members
                    .iter()
                    .map(|m| self.resolve(m, text, unknown))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Type::union(members))
            }
            TypeExpr::Named { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.resolve(a, text, unknown))
                    .collect::<Result<Vec<_>>>()?;
                self.resolve_named(name, args, text, unknown)
            }
        }
    }

    fn resolve_named(
        &self,
        name: &str,
        mut args: Vec<Type>,
        text: &str,
        unknown: &mut Vec<String>,
    ) -> Result<Type> {
        let got = args.len();
        let arity_error = |expected: &str| Error::InvalidAnnotation {
            text: text.to_string(),
            reason: format!("'{}' takes {}, got {}", name, expected, got),
        };

        match name {
            "array" => match args.len() {
                0 => Ok(Type::array(Type::ANY)),
                1 => Ok(Type::array(args.remove(0))),
                _ => Err(arity_error("one type argument")),
            },
            "table" => match args.len() {
                0 => Ok(Type::table(Type::ANY, Type::ANY)),
                2 => {
                    let value = args.remove(1);
                    Ok(Type::table(args.remove(0), value))
                }
                _ => Err(arity_error("two type arguments")),
            },
            "function" => match args.pop() {
                // function<P1, ..., Pn, R>
                Some(ret) => Ok(Type::function(args, ret)),
                None => Ok(Type::function(vec![Type::ANY], Type::ANY)),
            },
            _ if !args.is_empty() => Err(arity_error("no type arguments")),
            "null" | "void" => Ok(Type::NULL),
            "any" => Ok(Type::ANY),
            "class" | "instance" | "blob" => Ok(Type::class(ClassType::new(name))),
            _ => {
                if let Some(primitive) = PrimitiveType::from_name(name) {
                    return Ok(Type::Primitive(primitive));
                }
                match self.classes.get(name) {
                    Some(class) => Ok(Type::Class(class.clone())),
                    None => {
                        if !unknown.iter().any(|n| n == name) {
                            unknown.push(name.to_string());
                        }
                        Ok(Type::class(ClassType::new(name)))
                    }
                }
            }
        }
    }
}

//! Symbol records produced by declaration extraction
//!
//! Plain data: one record per declaration site. Annotations are kept as the
//! source text of the type; resolving them to `Type`s is the checker's job.

use serde::Serialize;

use crate::utils::Position;

/// Name of the root scope every scope path starts with
pub const GLOBAL_SCOPE: &str = "global";

/// Source location of a declaration
pub type Location = Position;

/// A local, field or parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    /// Annotation text; `None` means untyped
    pub declared_type: Option<String>,
    pub location: Location,
    /// Dot-joined names of the enclosing declarations
    pub scope_path: String,
    pub is_parameter: bool,
    pub is_field: bool,
    pub is_local: bool,
    /// Source text of the initializer or parameter default
    pub default_value: Option<String>,
}

impl Variable {
    /// Display form of the declared type, with untyped shown as `any`
    pub fn type_display(&self) -> &str {
        self.declared_type.as_deref().unwrap_or("any")
    }

    /// The synthetic `...` parameter
    pub fn is_varargs(&self) -> bool {
        self.is_parameter && self.name == "..."
    }
}

/// A free function, method or constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub return_type: Option<String>,
    pub location: Location,
    /// The scope opened by this function: enclosing path plus its own name
    pub scope_path: String,
}

impl Function {
    /// `a: int, b: any = 1`
    pub fn parameter_list(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match &p.default_value {
                Some(default) => format!("{}: {} = {}", p.name, p.type_display(), default),
                None => format!("{}: {}", p.name, p.type_display()),
            })
            .collect();
        params.join(", ")
    }

    /// `name(a: int, b: any = 1): void` style signature
    pub fn signature(&self) -> String {
        format!(
            "{}({}): {}",
            self.name,
            self.parameter_list(),
            self.return_type.as_deref().unwrap_or("void")
        )
    }
}

/// A class declaration with its members in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    pub name: String,
    pub fields: Vec<Variable>,
    pub methods: Vec<Function>,
    pub constructor: Option<Function>,
    /// Text of the `extends` expression, unresolved
    pub base_class: Option<String>,
    pub location: Location,
}

impl Class {
    pub fn new(name: impl Into<String>, base_class: Option<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructor: None,
            base_class,
            location,
        }
    }

    pub fn method(&self, name: &str) -> Option<&Function> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Output of one extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub variables: Vec<Variable>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(variables: Vec<Variable>, functions: Vec<Function>, classes: Vec<Class>) -> Self {
        Self {
            success: true,
            variables,
            functions,
            classes,
            error: None,
        }
    }

    /// A failed run carries no symbols
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            variables: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: Option<&str>, default: Option<&str>) -> Variable {
        Variable {
            name: name.to_string(),
            declared_type: ty.map(String::from),
            location: Location::new(1, 0),
            scope_path: "global.f".to_string(),
            is_parameter: true,
            is_field: false,
            is_local: false,
            default_value: default.map(String::from),
        }
    }

    #[test]
    fn test_signature() {
        let f = Function {
            name: "calculate".to_string(),
            parameters: vec![param("x", Some("int"), None), param("y", None, Some("10"))],
            return_type: Some("float".to_string()),
            location: Location::new(3, 4),
            scope_path: "global.calculate".to_string(),
        };
        assert_eq!(f.signature(), "calculate(x: int, y: any = 10): float");
    }

    #[test]
    fn test_failure_has_no_symbols() {
        let result = ExtractionResult::failure("boom");
        assert!(!result.success);
        assert!(result.variables.is_empty() && result.functions.is_empty() && result.classes.is_empty());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_json_shape() {
        let result = ExtractionResult::success(vec![param("x", Some("int"), None)], vec![], vec![]);
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["variables"][0]["declared_type"], "int");
        assert_eq!(json["variables"][0]["location"]["line"], 1);
    }
}

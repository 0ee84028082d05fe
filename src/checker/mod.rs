//! Declaration checking
//!
//! Consumes an `ExtractionResult` and reports structured diagnostics:
//! - annotation text that does not parse or names unknown types
//! - default values whose literal type does not fit the declared type
//! - class hierarchies with unknown bases or cycles
//! - untyped declarations (on request)

mod literal;

pub use literal::infer_literal;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use serde::Serialize;

use crate::symbols::{Class, ExtractionResult, Function, Location, Variable, GLOBAL_SCOPE};
use crate::types::{ClassType, Type, TypeResolver};

// ==================== Options ====================

/// Checker behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckerOptions {
    /// Emit `I001` for declarations without an annotation
    pub report_untyped: bool,
    /// Fail the report on warnings too
    pub warnings_as_errors: bool,
}

// ==================== Diagnostics ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Stable code (e.g. "E001")
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    pub scope_path: String,
}

impl Diagnostic {
    fn new(code: &str, severity: Severity, message: String, location: Location, scope_path: &str) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message,
            location,
            scope_path: scope_path.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}[{}]: {}", self.location, self.severity, self.code, self.message)
    }
}

/// Outcome of a check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Codes of all diagnostics, in report order
    pub fn codes(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    /// Output as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ==================== Checker ====================

/// Checks extracted declarations against their annotations
pub struct Checker {
    options: CheckerOptions,
    resolver: TypeResolver,
    diagnostics: Vec<Diagnostic>,
}

impl Checker {
    pub fn new(options: CheckerOptions) -> Self {
        Self {
            options,
            resolver: TypeResolver::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Resolved type of a class seen by the last `check` run
    pub fn class_type(&self, name: &str) -> Option<&Arc<ClassType>> {
        self.resolver.class(name)
    }

    /// Check one extraction result
    pub fn check(&mut self, result: &ExtractionResult) -> CheckReport {
        self.resolver = TypeResolver::new();
        self.diagnostics.clear();

        if !result.success {
            let message = result.error.as_deref().unwrap_or("extraction failed");
            self.diagnostics.push(Diagnostic::new(
                "E000",
                Severity::Error,
                format!("Extraction failed: {}", message),
                Location::new(1, 0),
                GLOBAL_SCOPE,
            ));
            return self.report();
        }

        self.declare_classes(&result.classes);

        for variable in &result.variables {
            self.check_variable(variable);
        }
        for function in &result.functions {
            self.check_function(function);
        }
        for class in &result.classes {
            if let Some(constructor) = &class.constructor {
                self.check_function(constructor);
            }
            for method in &class.methods {
                self.check_function(method);
            }
        }

        debug!("check finished with {} diagnostics", self.diagnostics.len());
        self.report()
    }

    fn report(&self) -> CheckReport {
        let failing = |d: &&Diagnostic| match d.severity {
            Severity::Error => true,
            Severity::Warning => self.options.warnings_as_errors,
            Severity::Info => false,
        };
        CheckReport {
            success: !self.diagnostics.iter().any(|d| failing(&d)),
            diagnostics: self.diagnostics.clone(),
        }
    }

    fn push(&mut self, code: &str, severity: Severity, message: String, location: Location, scope_path: &str) {
        trace!("{} {}: {}", code, location, message);
        self.diagnostics.push(Diagnostic::new(code, severity, message, location, scope_path));
    }

    // ==================== Classes ====================

    /// Resolve base names and make every class known to the resolver.
    ///
    /// Runs twice: the first pass gives every class its base chain so
    /// member annotations can name any class; the second adds members.
    fn declare_classes(&mut self, classes: &[Class]) {
        let mut by_name: HashMap<&str, &Class> = HashMap::new();
        for class in classes {
            by_name.entry(class.name.as_str()).or_insert(class);
        }

        for class in classes {
            if let Some(base) = &class.base_class {
                if !by_name.contains_key(base.as_str()) {
                    self.push(
                        "W002",
                        Severity::Warning,
                        format!("Unknown base class '{}' for class '{}'", base, class.name),
                        class.location,
                        GLOBAL_SCOPE,
                    );
                }
            }
        }

        let cyclic = self.find_cycles(classes, &by_name);

        let mut skeletons = HashMap::new();
        for class in classes {
            let ty = build_class(&class.name, &by_name, &cyclic, &mut skeletons, None);
            self.resolver.define_class(ty);
        }

        let resolver = self.resolver.clone();
        let mut complete = HashMap::new();
        for class in classes {
            let ty = build_class(&class.name, &by_name, &cyclic, &mut complete, Some(&resolver));
            self.resolver.define_class(ty);
        }
    }

    /// Names of classes whose base chain leads back to themselves
    fn find_cycles(&mut self, classes: &[Class], by_name: &HashMap<&str, &Class>) -> HashSet<String> {
        let mut cyclic = HashSet::new();
        for class in classes {
            let mut chain = vec![class.name.as_str()];
            let mut current = class;
            while let Some(base) = current.base_class.as_deref().and_then(|b| by_name.get(b).copied()) {
                if base.name == class.name {
                    chain.push(base.name.as_str());
                    cyclic.insert(class.name.clone());
                    break;
                }
                if chain.contains(&base.name.as_str()) {
                    // Leads into a cycle that does not include this class
                    break;
                }
                chain.push(base.name.as_str());
                current = base;
            }
            if cyclic.contains(&class.name) {
                let message = format!("Inheritance cycle: {}", chain.join(" -> "));
                self.push("E004", Severity::Error, message, class.location, GLOBAL_SCOPE);
            }
        }
        cyclic
    }

    // ==================== Declarations ====================

    fn check_variable(&mut self, variable: &Variable) {
        let Some(text) = variable.declared_type.as_deref() else {
            if self.options.report_untyped && !variable.is_varargs() {
                let what = match (variable.is_parameter, variable.is_field) {
                    (true, _) => "Parameter",
                    (false, true) => "Field",
                    (false, false) => "Variable",
                };
                self.push(
                    "I001",
                    Severity::Info,
                    format!("{} '{}' has no type annotation", what, variable.name),
                    variable.location,
                    &variable.scope_path,
                );
            }
            return;
        };

        let Some(declared) = self.resolve(text, variable.location, &variable.scope_path) else {
            return;
        };

        let Some(default) = variable.default_value.as_deref() else {
            return;
        };
        if let Some(value) = infer_literal(default) {
            if !accepts(&declared, &value) {
                self.push(
                    "E001",
                    Severity::Error,
                    format!(
                        "Default value '{}' of type '{}' is not assignable to '{}' declared for '{}'",
                        default, value, declared, variable.name
                    ),
                    variable.location,
                    &variable.scope_path,
                );
            }
        }
    }

    fn check_function(&mut self, function: &Function) {
        for param in &function.parameters {
            self.check_variable(param);
        }

        if function.name == "constructor" {
            return;
        }
        match function.return_type.as_deref() {
            Some(text) => {
                self.resolve(text, function.location, &function.scope_path);
            }
            None if self.options.report_untyped => self.push(
                "I001",
                Severity::Info,
                format!("Function '{}' has no return type annotation", function.name),
                function.location,
                &function.scope_path,
            ),
            None => {}
        }
    }

    /// Resolve annotation text, reporting `E003` and `W001`
    fn resolve(&mut self, text: &str, location: Location, scope_path: &str) -> Option<Type> {
        match self.resolver.resolve_text(text) {
            Ok(resolution) => {
                for name in &resolution.unknown_names {
                    self.push(
                        "W001",
                        Severity::Warning,
                        format!("Unknown type '{}'", name),
                        location,
                        scope_path,
                    );
                }
                Some(resolution.ty)
            }
            Err(err) => {
                self.push("E003", Severity::Error, err.to_string(), location, scope_path);
                None
            }
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(CheckerOptions::default())
    }
}

/// Build (or reuse) the type of class `name` with its resolved base chain.
/// Classes on a cycle get no base. Members are added only when a resolver
/// for their annotations is given.
fn build_class(
    name: &str,
    by_name: &HashMap<&str, &Class>,
    cyclic: &HashSet<String>,
    built: &mut HashMap<String, Arc<ClassType>>,
    members: Option<&TypeResolver>,
) -> Arc<ClassType> {
    if let Some(ty) = built.get(name) {
        return ty.clone();
    }

    let mut ty = ClassType::new(name);
    if let Some(class) = by_name.get(name) {
        if !cyclic.contains(name) {
            if let Some(base) = class.base_class.as_deref().filter(|b| by_name.contains_key(b)) {
                ty = ty.with_base(build_class(base, by_name, cyclic, built, members));
            }
        }
        if let Some(resolver) = members {
            for (member, member_ty) in class_members(class, resolver) {
                ty = ty.with_member(member, member_ty);
            }
        }
    }

    let ty = Arc::new(ty);
    built.insert(name.to_string(), ty.clone());
    ty
}

/// Field and method types of a class; unresolvable annotations become `any`
fn class_members(class: &Class, resolver: &TypeResolver) -> Vec<(String, Type)> {
    let annotated = |text: Option<&str>| {
        text.and_then(|t| resolver.resolve_text(t).ok())
            .map(|r| r.ty)
            .unwrap_or(Type::ANY)
    };

    let fields = class
        .fields
        .iter()
        .map(|f| (f.name.clone(), annotated(f.declared_type.as_deref())));
    let methods = class.methods.iter().map(|m| {
        let params = m.parameters.iter().map(|p| annotated(p.declared_type.as_deref())).collect();
        (m.name.clone(), Type::function(params, annotated(m.return_type.as_deref())))
    });
    fields.chain(methods).collect()
}

/// Whether a value of type `value` may initialize a declaration of type
/// `declared`. Wider than `is_assignable_to`: a plain value fits an
/// optional or a union that has a fitting member.
pub fn accepts(declared: &Type, value: &Type) -> bool {
    if value.is_assignable_to(declared) {
        return true;
    }
    match (declared, value) {
        (Type::Optional(inner), _) => accepts(inner, value),
        (Type::Union(members), _) => members.iter().any(|m| accepts(m, value)),
        (Type::Array(elem), Type::Array(value_elem)) => accepts(elem, value_elem),
        (_, Type::Union(values)) => values.iter().all(|v| accepts(declared, v)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_source;

    fn check_with(source: &str, options: CheckerOptions) -> CheckReport {
        let result = extract_source(source);
        Checker::new(options).check(&result)
    }

    fn check(source: &str) -> CheckReport {
        check_with(source, CheckerOptions::default())
    }

    #[test]
    fn test_clean_source() {
        let report = check(
            r#"
local name: string = "Alice";
local scores: array<int> = [95, 87, 92];
local maybe: string? = null;
local either: int | string = 3;
function calculate(x: int, y: int = 10): float { return x + y; }
"#,
        );
        assert!(report.success);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    #[test]
    fn test_default_value_mismatch() {
        let report = check("local age: int = \"twenty\";\nlocal nums: array<int> = [\"a\", \"b\"];");
        assert!(!report.success);
        assert_eq!(report.codes(), vec!["E001", "E001"]);
        assert_eq!(report.diagnostics[0].location, Location::new(1, 6));
        assert_eq!(
            report.diagnostics[0].message,
            "Default value '\"twenty\"' of type 'string' is not assignable to 'int' declared for 'age'"
        );
    }

    #[test]
    fn test_parameter_default_checked() {
        let report = check("function f(flag: bool = 1) {}");
        assert_eq!(report.codes(), vec!["E001"]);
        assert_eq!(report.diagnostics[0].scope_path, "global.f");
    }

    #[test]
    fn test_annotation_problems() {
        let report = check("local a: array<int, int>;\nlocal b: Widget;");
        assert_eq!(report.codes(), vec!["E003", "W001"]);
        assert_eq!(report.diagnostics[1].message, "Unknown type 'Widget'");
        assert!(!report.success);
    }

    #[test]
    fn test_class_names_resolve() {
        let report = check(
            r#"
class Person { name: string = ""; }
class Student extends Person { id: int = 0; }
local s: Student = null;
function enroll(p: Person?): Student? { return null; }
"#,
        );
        // `null` is not a Student
        assert_eq!(report.codes(), vec!["E001"]);
    }

    #[test]
    fn test_unknown_base_and_cycles() {
        let mut checker = Checker::default();
        let report = checker.check(&extract_source(
            "class A extends B {}\nclass B extends A {}\nclass C extends A {}\nclass D extends Missing {}",
        ));
        assert_eq!(report.codes(), vec!["W002", "E004", "E004"]);
        assert_eq!(report.diagnostics[1].message, "Inheritance cycle: A -> B -> A");

        // Classes leading into a cycle still resolve, without looping
        let c = checker.class_type("C").unwrap();
        assert!(c.inherits_from("A"));
        assert!(checker.class_type("A").unwrap().base.is_none());
    }

    #[test]
    fn test_class_members_resolved() {
        let mut checker = Checker::default();
        checker.check(&extract_source(
            "class P { age: int; function greet(n: string): string { return n; } }\nclass Q extends P {}",
        ));
        let q = checker.class_type("Q").unwrap();
        assert_eq!(q.member("age"), Some(&Type::INT));
        assert_eq!(
            q.member("greet"),
            Some(&Type::function(vec![Type::STRING], Type::STRING))
        );
    }

    #[test]
    fn test_report_untyped() {
        let options = CheckerOptions { report_untyped: true, ..Default::default() };
        let report = check_with("local x = 1;\nfunction f(a, ...) {}\nclass C { n = 0 }", options);
        let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Variable 'x' has no type annotation",
                "Field 'n' has no type annotation",
                "Parameter 'a' has no type annotation",
                "Function 'f' has no return type annotation",
            ]
        );
        assert_eq!(report.codes(), vec!["I001"; 4]);
        assert!(report.success);
    }

    #[test]
    fn test_warnings_as_errors() {
        let source = "local w: Widget;";
        assert!(check(source).success);
        let options = CheckerOptions { warnings_as_errors: true, ..Default::default() };
        assert!(!check_with(source, options).success);
    }

    #[test]
    fn test_failed_extraction() {
        let report = check("local = ;");
        assert!(!report.success);
        assert_eq!(report.codes(), vec!["E000"]);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn test_accepts() {
        assert!(accepts(&Type::optional(Type::INT), &Type::INT));
        assert!(accepts(&Type::optional(Type::INT), &Type::NULL));
        assert!(accepts(&Type::union([Type::INT, Type::STRING]), &Type::STRING));
        assert!(accepts(
            &Type::array(Type::union([Type::INT, Type::STRING])),
            &Type::array(Type::union([Type::INT, Type::STRING]))
        ));
        assert!(accepts(&Type::array(Type::optional(Type::INT)), &Type::array(Type::INT)));
        assert!(!accepts(&Type::INT, &Type::FLOAT));
        assert!(!accepts(&Type::optional(Type::INT), &Type::STRING));
    }

    #[test]
    fn test_diagnostic_display_and_json() {
        let report = check("local age: int = \"x\";");
        assert_eq!(
            report.diagnostics[0].to_string(),
            "1:6: error[E001]: Default value '\"x\"' of type 'string' is not assignable to 'int' declared for 'age'"
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["diagnostics"][0]["severity"], "error");
        assert_eq!(json["diagnostics"][0]["location"]["column"], 6);
    }
}

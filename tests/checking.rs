use pretty_assertions::assert_eq;

use sqtyped::checker::{Checker, CheckerOptions, Severity};
use sqtyped::extract::extract_source;
use sqtyped::types::Type;

const PEOPLE: &str = include_str!("data/people.nut");

#[test]
fn sample_program_is_clean() {
    let mut checker = Checker::default();
    let report = checker.check(&extract_source(PEOPLE));
    assert!(report.success);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let student = checker.class_type("Student").unwrap();
    let person = Type::Class(checker.class_type("Person").unwrap().clone());
    assert!(Type::Class(student.clone()).is_assignable_to(&person));
    assert_eq!(student.member("getName"), Some(&Type::function(vec![], Type::STRING)));
    assert_eq!(student.member("grades"), Some(&Type::array(Type::INT)));
}

#[test]
fn reports_mismatched_defaults() {
    let source = r#"
local name: string = 123;
local age: int = "twenty";
local numbers: array<int> = ["a", "b"];
local ok: float = 1.5;
"#;
    let report = Checker::default().check(&extract_source(source));
    assert!(!report.success);

    let found: Vec<(String, u32)> = report
        .diagnostics
        .iter()
        .map(|d| (d.code.clone(), d.location.line))
        .collect();
    assert_eq!(
        found,
        vec![
            ("E001".to_string(), 2),
            ("E001".to_string(), 3),
            ("E001".to_string(), 4),
        ]
    );
    assert!(report.diagnostics.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn untyped_report_covers_parameters_and_returns() {
    let options = CheckerOptions { report_untyped: true, warnings_as_errors: false };
    let report = Checker::new(options).check(&extract_source("function f(a, b: int) { local t; }"));
    let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Variable 't' has no type annotation",
            "Parameter 'a' has no type annotation",
            "Function 'f' has no return type annotation",
        ]
    );
    assert!(report.success);
}

#[test]
fn report_serializes_to_json() {
    let report = Checker::default().check(&extract_source("class A extends Missing {}"));
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["diagnostics"][0]["code"], "W002");
    assert_eq!(json["diagnostics"][0]["severity"], "warning");
    assert_eq!(json["diagnostics"][0]["location"]["line"], 1);
}

use pretty_assertions::assert_eq;

use sqtyped::extract::extract_source;
use sqtyped::symbols::{Location, Variable};

const PEOPLE: &str = include_str!("data/people.nut");

fn summary(vars: &[Variable]) -> Vec<(String, String, String)> {
    vars.iter()
        .map(|v| (v.name.clone(), v.type_display().to_string(), v.scope_path.clone()))
        .collect()
}

fn entry(name: &str, ty: &str, scope: &str) -> (String, String, String) {
    (name.to_string(), ty.to_string(), scope.to_string())
}

#[test]
fn extracts_sample_program() {
    let result = extract_source(PEOPLE);
    assert!(result.success, "{:?}", result.error);

    assert_eq!(
        summary(&result.variables),
        vec![
            entry("name", "string", "global"),
            entry("age", "int", "global"),
            entry("scores", "array<int>", "global"),
            entry("optional", "string?", "global"),
            entry("name", "string", "global.Person"),
            entry("age", "int", "global.Person"),
            entry("grades", "array<int>", "global.Person"),
            entry("sum", "int", "global.Person.getAverage"),
            entry("studentId", "string", "global.Student"),
        ]
    );
    assert_eq!(result.variables[2].default_value.as_deref(), Some("[95,87,92]"));
    assert_eq!(result.variables[0].location, Location::new(2, 6));

    let signatures: Vec<String> = result.functions.iter().map(|f| f.signature()).collect();
    assert_eq!(
        signatures,
        vec![
            "greet(name: string, age: int): string".to_string(),
            "calculate(x: int, y: int = 10): float".to_string(),
        ]
    );
    assert_eq!(result.functions[0].location, Location::new(8, 0));
    assert_eq!(result.functions[1].parameters[1].scope_path, "global.calculate");
}

#[test]
fn extracts_class_members() {
    let result = extract_source(PEOPLE);

    let person = result.class("Person").unwrap();
    assert_eq!(person.base_class, None);
    assert_eq!(person.fields.len(), 3);
    let methods: Vec<&str> = person.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["getName", "addGrade", "getAverage"]);
    assert_eq!(person.method("addGrade").unwrap().return_type.as_deref(), Some("void"));

    let student = result.class("Student").unwrap();
    assert_eq!(student.base_class.as_deref(), Some("Person"));
    assert_eq!(student.fields.len(), 1);
    assert_eq!(student.methods.len(), 1);
    assert_eq!(student.methods[0].scope_path, "global.Student.getId");

    let constructor = student.constructor.as_ref().unwrap();
    assert_eq!(constructor.parameter_list(), "name: string, age: int, id: string");
    assert_eq!(constructor.return_type, None);
    assert!(constructor
        .parameters
        .iter()
        .all(|p| p.scope_path == "global.Student.constructor"));
}

#[test]
fn extraction_is_repeatable() {
    let first = extract_source(PEOPLE);
    let second = extract_source(PEOPLE);
    assert_eq!(first, second);
}

#[test]
fn json_output_lists_every_symbol() {
    let result = extract_source(PEOPLE);
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["variables"].as_array().unwrap().len(), 9);
    assert_eq!(json["classes"][1]["base_class"], "Person");
    assert_eq!(json["error"], serde_json::Value::Null);
}

#[test]
fn syntax_error_yields_no_symbols() {
    let result = extract_source("class Broken {\n  function f( {}\n}");
    assert!(!result.success);
    assert!(result.variables.is_empty());
    assert!(result.functions.is_empty());
    assert!(result.classes.is_empty());
    assert!(result.error.unwrap().starts_with("Parse error at 2:"));
}

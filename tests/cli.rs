use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const USERS: &str = r#"
- id: u1
  name: Ada
  company: Acme
  employees: 50
  created: 2024-06-03
  lastSeen: 2024-06-09T18:30:00
- id: u2
  name: Grace
  company: Initech
  employees: 120
  created: 2023-12-25
  lastSeen: null
- id: u3
  name: Linus
  company: Acme
  employees: n/a
  created: 2024-05-20
  lastSeen: 2024-01-01
"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn ruleq(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ruleq"))
        .args(args)
        .env_remove("RULEQ_DATA")
        .env_remove("RULEQ_CONFIG")
        .output()
        .expect("failed to execute process")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn first_column(output: &Output) -> Vec<String> {
    stdout(output)
        .lines()
        .skip(2)
        .filter_map(|line| line.split_whitespace().next().map(str::to_string))
        .collect()
}

#[test]
fn where_rule_matches() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--where",
        "company contains acme",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert_eq!(out.lines().next(), Some("2 of 3 records"));
    assert!(out.lines().nth(1).unwrap().starts_with("ID"));
    assert_eq!(first_column(&output), ["u1", "u3"]);
}

#[test]
fn no_match_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--where",
        "employees > 1000",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("No records match the current filters"));
}

#[test]
fn where_rules_combine_with_any() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--today",
        "2024-06-10",
        "--where",
        "lastSeen last 7,days",
        "--where",
        "company = Initech",
        "--any",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(first_column(&output), ["u1", "u2"]);
}

#[test]
fn nested_query_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);
    let query = write_file(
        dir.path(),
        "query.yaml",
        r#"
combinator: or
rules:
  - { field: employees, operator: isNotNumeric }
  - combinator: and
    rules:
      - { field: company, operator: startsWith, value: acme }
      - { field: employees, operator: between, value: [10, 60] }
"#,
    );

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--query",
        query.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(first_column(&output), ["u1", "u3"]);
}

#[test]
fn json_output() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--format",
        "json",
        "--where",
        "lastSeen isNotSet",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["id"], "u2");
    assert_eq!(record["employees"], 120.0);
}

#[test]
fn today_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);
    let config = write_file(dir.path(), "ruleq.yaml", "today: 2024-06-10\n");

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--where",
        "created last 7,days",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(first_column(&output), ["u1"]);
}

#[test]
fn values_with_count() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);

    let output = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--values",
        "company",
        "--count",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "Acme: 2\nInitech: 1\n");
}

#[test]
fn directory_of_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.json", r#"[{"id": "j1", "company": "Acme"}]"#);
    write_file(dir.path(), "b.yaml", USERS);
    write_file(dir.path(), "notes.md", "not records");

    let output = ruleq(&[
        "--data",
        dir.path().to_str().unwrap(),
        "--where",
        "company = acme",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).lines().next(), Some("3 of 4 records"));
    assert_eq!(first_column(&output), ["j1", "u1", "u3"]);
}

#[test]
fn fields_listing() {
    let output = ruleq(&["--fields"]);

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("employees [number]"));
    assert!(out.contains("last (in the last)"));
}

#[test]
fn errors_exit_two() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_file(dir.path(), "users.yaml", USERS);
    let dupes = write_file(dir.path(), "dupes.yaml", "- { id: a }\n- { id: a }\n");

    let unknown = ruleq(&[
        "--data",
        data.to_str().unwrap(),
        "--where",
        "company resembles acme",
    ]);
    assert_eq!(unknown.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("Unknown operator"));

    let missing = ruleq(&["--where", "company = acme"]);
    assert_eq!(missing.status.code(), Some(2));

    let duplicate = ruleq(&["--data", dupes.to_str().unwrap()]);
    assert_eq!(duplicate.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&duplicate.stderr).contains("duplicate record id"));
}

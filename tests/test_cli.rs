mod fixtures;

use fixtures::*;

use assert_cmd::Command;
use predicates::prelude::*;

fn yang_json_dump() -> Command {
    Command::new(assert_cmd::cargo_bin!("yang_json_dump"))
}

#[test]
fn it_converts_stdin_json_to_xml_without_schema() {
    yang_json_dump()
        .arg("--no-indent")
        .write_stdin(r#"{"ex:a": {"b": 1, "c": ["x", "y"]}}"#)
        .assert()
        .success()
        .stdout("<ex:a><b>1</b><c>x</c><c>y</c></ex:a>");
}

#[test]
fn it_supports_stdin_input_with_dash() {
    yang_json_dump()
        .args(["--no-indent", "-j", "-"])
        .write_stdin(r#"{"ex:a": {"b": 1}}"#)
        .assert()
        .success()
        .stdout(r#"{"ex:a":{"b":"1"}}"#);
}

#[test]
fn it_round_trips_the_sample_with_a_schema() {
    let schema = example_schema_path();
    let sample = system_json();
    yang_json_dump()
        .args(["-j", "-y", schema.to_str().unwrap(), sample.to_str().unwrap()])
        .assert()
        .success()
        .stdout(read_sample(system_json()));
}

#[test]
fn it_encodes_xml_input_in_schema_order() {
    let schema = example_schema_path();
    let sample = unsorted_xml();
    yang_json_dump()
        .args(["--xml-input", "-j", "--no-indent", "-y", schema.to_str().unwrap(), sample.to_str().unwrap()])
        .assert()
        .success()
        .stdout(r#"{"example:system":{"hostname":"r1","mtu":1500,"priority":[9,10]}}"#);
}

#[test]
fn it_fails_on_malformed_json() {
    yang_json_dump()
        .write_stdin(r#"{"ex:a": "#)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn it_reports_schema_rejections_on_stderr() {
    let schema = example_schema_path();
    yang_json_dump()
        .args(["-y", schema.to_str().unwrap()])
        .write_stdin(r#"{"y": 5}"#)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("<error-tag>malformed-message</error-tag>"));
}

#[test]
fn it_rejects_unknown_binding_modes() {
    yang_json_dump()
        .args(["-b", "sideways"])
        .write_stdin("{}")
        .assert()
        .failure();
}

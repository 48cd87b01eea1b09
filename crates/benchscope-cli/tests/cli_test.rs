//! End-to-end tests of the `bench` binary that need no backend.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DELTAS: &str = r#"{
  "attribute": "gender",
  "baseline": "male",
  "rows": [
    {"category": "female", "delta": 0.25, "p_value": 0.012, "q_value": 0.03, "significant": true},
    {"category": "non-binary, other", "delta": -0.05, "p_value": 0.6, "significant": false},
    {"category": "diverse"}
  ]
}"#;

const KRUSKAL: &str = r#"{
  "overall": [
    {"attribute": "age", "h": 14.2, "p_value": 0.0008, "eta_squared": 0.04, "groups": 3, "n": 300, "significant": true},
    {"attribute": "skin_tone", "h": 1.1, "p_value": 0.57, "eta_squared": 0.001, "groups": 4, "n": 300, "significant": false}
  ],
  "by_category": {
    "competence": [
      {"attribute": "age", "h": 9.0, "p_value": 0.011, "significant": true}
    ]
  }
}"#;

fn bench(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bench").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "error");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    bench(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("kruskal"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_export_deltas_csv_from_file() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "deltas.json", DELTAS);
    bench(&tmp)
        .args(["export", "--input", &input, "--columns", "category,delta,significant"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Category,Delta,Significant\r\n"))
        .stdout(predicate::str::contains("female,0.2500,true"))
        .stdout(predicate::str::contains("\"non-binary, other\",-0.0500,false"))
        .stdout(predicate::str::contains("diverse,,"));
}

#[test]
fn test_export_significant_only() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "deltas.json", DELTAS);
    bench(&tmp)
        .args(["export", "--input", &input, "--columns", "category", "--significant"])
        .assert()
        .success()
        .stdout(predicate::str::contains("female"))
        .stdout(predicate::str::contains("diverse").not());
}

#[test]
fn test_export_kruskal_latex_to_file() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "kruskal.json", KRUSKAL);
    let out = tmp.path().join("kw.tex");
    bench(&tmp)
        .args([
            "export",
            "--input",
            &input,
            "--table",
            "kruskal",
            "--format",
            "latex",
            "--columns",
            "attribute,h,p",
            "--output",
        ])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let tex = std::fs::read_to_string(&out).unwrap();
    assert!(tex.contains("\\begin{tabular}{lrr}"));
    assert!(tex.contains("skin\\_tone & 1.1000 & 0.5700 \\\\"));
    assert!(tex.contains("age & 14.2000 & 8.000e-4 \\\\"));
}

#[test]
fn test_export_kruskal_category_tab() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "kruskal.json", KRUSKAL);
    bench(&tmp)
        .args(["export", "--input", &input, "--table", "kruskal", "--category", "competence", "--columns", "attribute,h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("age,9.0000"))
        .stdout(predicate::str::contains("skin_tone").not());
}

#[test]
fn test_export_kruskal_unknown_category_fails() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "kruskal.json", KRUSKAL);
    bench(&tmp)
        .args(["export", "--input", &input, "--table", "kruskal", "--category", "warmth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown trait category 'warmth' (available: competence)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_deltas_from_run_sends_trait_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/deltas"))
        .and(query_param("attribute", "gender"))
        .and(query_param("trait_category", "competence"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DELTAS))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    bench(&tmp)
        .args(["--api", &server.uri(), "export", "7", "-a", "gender", "-c", "competence", "--columns", "category"])
        .assert()
        .success()
        .stdout(predicate::str::contains("female"));
}

#[test]
fn test_unknown_column_fails() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "deltas.json", DELTAS);
    bench(&tmp)
        .args(["export", "--input", &input, "--columns", "category,bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown column 'bogus'"));
}

#[test]
fn test_unsupported_format_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let input = write(&tmp, "deltas.json", DELTAS);
    bench(&tmp)
        .args(["export", "--input", &input, "--format", "xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported export format"));
}

#[test]
fn test_invalid_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "benchscope.yaml", "api_base_url: not-a-url\n");
    bench(&tmp)
        .arg("runs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("api_base_url"));
}

#[test]
fn test_unreachable_backend_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    bench(&tmp)
        .args(["--api", "http://127.0.0.1:9", "runs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network error"));
}

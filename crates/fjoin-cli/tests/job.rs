//! End-to-end runs of job files against CSV inputs on disk.

use std::fs;
use std::path::{Path, PathBuf};

use fjoin_cli::cli::{JoinArgs, JoinKindArg};
use fjoin_cli::commands::run_join;
use fjoin_ingest::read_csv_table;
use fjoin_model::JoinKind;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn fixture(job: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "left.csv", "id,v\n1,caat\n2,dog\n");
    write(
        dir.path(),
        "right/learningData.csv",
        "id,v,score\n1,cat,0.5\n2,bird,0.7\n",
    );
    write(dir.path(), "right/other.csv", "a\n1\n");
    let job_path = write(dir.path(), "job.toml", job);
    (dir, job_path)
}

const JOB: &str = r#"
join_kind = "left"
output = "out/joined.csv"

[left]
path = "left.csv"

[right]
path = "right"
resource = "learningData"

[join]
left_columns = "v"
right_columns = "v"
accuracy = 0.8
"#;

fn args(job: PathBuf) -> JoinArgs {
    JoinArgs {
        job,
        output: None,
        join_kind: None,
        dry_run: false,
    }
}

#[test]
fn job_writes_joined_csv() {
    let (dir, job) = fixture(JOB);
    let mut join_args = args(job);
    join_args.join_kind = Some(JoinKindArg::Inner);

    let outcome = run_join(&join_args).unwrap();
    assert_eq!(outcome.join_kind, JoinKind::Inner);
    assert_eq!(outcome.rows, 1);
    assert_eq!(outcome.left_rows, 2);
    assert_eq!(outcome.right_rows, 2);

    let written = dir.path().join("out/joined.csv");
    assert_eq!(outcome.output.as_deref(), Some(written.as_path()));
    let table = read_csv_table(&written).unwrap();
    assert_eq!(table.column_names(), vec!["id_left", "v", "id_right", "score"]);
    let v = table.data.column("v").unwrap().str().unwrap().get(0).map(str::to_string);
    assert_eq!(v.as_deref(), Some("caat"));

    insta::assert_json_snapshot!(outcome.pairs, @r#"
    [
      {
        "left_column": "v",
        "right_column": "v",
        "join_type": "string",
        "key_columns": 1,
        "left_values": 2,
        "matched": 1,
        "coercion_failures": 0
      }
    ]
    "#);
}

#[test]
fn job_join_kind_applies_without_override() {
    let (_dir, job) = fixture(JOB);
    let outcome = run_join(&args(job)).unwrap();
    assert_eq!(outcome.join_kind, JoinKind::Left);
    assert_eq!(outcome.rows, 2);
}

#[test]
fn dry_run_writes_nothing() {
    let (dir, job) = fixture(JOB);
    let mut join_args = args(job);
    join_args.dry_run = true;

    let outcome = run_join(&join_args).unwrap();
    assert!(outcome.output.is_none());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_output_is_an_error() {
    let job = JOB.replace("output = \"out/joined.csv\"", "");
    let (_dir, job) = fixture(&job);
    let err = run_join(&args(job)).unwrap_err();
    assert!(err.to_string().contains("no output path"));
}

#[test]
fn unknown_dataset_resource_is_reported() {
    let job = JOB.replace("resource = \"learningData\"", "resource = \"missing\"");
    let (_dir, job) = fixture(&job);
    let err = run_join(&args(job)).unwrap_err();
    assert!(format!("{err:#}").contains("no resource named 'missing'"));
}

#[test]
fn invalid_accuracy_is_reported() {
    let job = JOB.replace("accuracy = 0.8", "accuracy = 1.8");
    let (_dir, job) = fixture(&job);
    let err = run_join(&args(job)).unwrap_err();
    assert!(format!("{err:#}").contains("out of range"));
}

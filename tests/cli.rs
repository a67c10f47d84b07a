use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

/// The binary, run from `cwd` so no `.env` of the checkout is loaded, with
/// every configuration variable cleared.
fn worker(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gpu-worker").expect("Binary exists");
    cmd.current_dir(cwd)
        .env_remove("GCS_CREDENTIALS_JSON")
        .env_remove("BUCKET_NAME")
        .env_remove("SYNC_DESTINATION")
        .env_remove("STORAGE_ENDPOINT")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn sync_without_credential_fails_with_configuration_error() {
    let dest = tempdir().unwrap();
    let out = dest.path().join("out");

    worker(dest.path())
        .arg("sync")
        .arg("--destination")
        .arg(&out)
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("\"status\": \"error\"")
                .and(predicate::str::contains("configuration_error")),
        );
    assert!(!out.exists());
}

#[test]
fn invoke_list_files_from_job_file() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.bin"), [1u8, 2, 3]).unwrap();
    let job = NamedTempFile::new().expect("temp job file");
    let payload = serde_json::json!({
        "id": "local-test",
        "input": {"action": "list_files", "path": dir.path()}
    });
    write(job.path(), payload.to_string()).unwrap();

    worker(dir.path())
        .arg("invoke")
        .arg("--job")
        .arg(job.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"status\": \"success\"")
                .and(predicate::str::contains("a.bin")),
        );
}

#[test]
fn invoke_reads_job_from_stdin() {
    let cwd = tempdir().unwrap();
    worker(cwd.path())
        .arg("invoke")
        .write_stdin(r#"{"input": {"action": "format_disk"}}"#)
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid_input"));
}

#[test]
fn invoke_with_malformed_job_reports_parse_error() {
    let cwd = tempdir().unwrap();
    worker(cwd.path())
        .arg("invoke")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse job JSON"));
}

#[test]
fn sync_honours_config_file() {
    let dest = tempdir().unwrap();
    let config = NamedTempFile::new().expect("temp config");
    write(
        config.path(),
        format!(
            "bucket: weights\ndestination: {}\n",
            dest.path().join("from-config").display()
        ),
    )
    .unwrap();

    // Still no credential, so the run stops at validation.
    worker(dest.path())
        .arg("sync")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("configuration_error"))
        .stderr(predicate::str::contains("weights"));
}

#[test]
fn sync_without_configuration_uses_built_in_destination() {
    let cwd = tempdir().unwrap();
    worker(cwd.path())
        .arg("sync")
        .assert()
        .failure()
        .stdout(predicate::str::contains("configuration_error"))
        .stderr(predicate::str::contains("/runpod-volume/models"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let msg = format!("{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use gpu_worker::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Invoke {
            job: Some(std::path::PathBuf::from("dummy-job.json")),
            config: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "missing job file must be an error");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

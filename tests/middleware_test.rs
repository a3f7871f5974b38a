use anyhow::Result;
use async_trait::async_trait;
use orchestra_ops::adapters::{CollectingMessenger, DryRunRunner};
use orchestra_ops::domain::model::{MessageLevel, Server, ServerOutput};
use orchestra_ops::{
    app, Change, Executor, Instance, LogState, OperationCollector, OperationsMiddleware, OrchestraConfig,
    Request, Response, Scenario, ScriptRunner,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
[orchestration]
admin_path_prefix = "/admin/"

[[servers]]
name = "web"
address = "10.0.0.10"

[[servers]]
name = "mail"
address = "10.0.0.20"

[[backends]]
name = "system-user"
model = "users.User"
ignore_fields = ["last_login"]
save = ["id {username} || useradd {username}"]
delete = ["userdel {username}"]

[[backends]]
name = "mailbox"
model = "mailboxes.Mailbox"
save = ["mkdir -p /var/mail/{name}"]
delete = ["rm -rf /var/mail/{name}"]

[[backends.related]]
model = "users.User"
relation = "mailboxes"
many = true

[[routes]]
backend = "system-user"
host = "web"

[[routes]]
backend = "mailbox"
host = "mail"
"#;

/// Counts runs and fails on one server.
#[derive(Default)]
struct CountingRunner {
    runs: AtomicUsize,
    failing_server: Option<&'static str>,
}

#[async_trait]
impl ScriptRunner for CountingRunner {
    async fn run(&self, server: &Server, _backend: &str, _script: &str) -> orchestra_ops::Result<ServerOutput> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let exit_code = if Some(server.name.as_str()) == self.failing_server { 1 } else { 0 };
        Ok(ServerOutput {
            exit_code,
            ..ServerOutput::default()
        })
    }
}

fn middleware(runner: Arc<dyn ScriptRunner>, messenger: Arc<CollectingMessenger>) -> OperationsMiddleware {
    let config = OrchestraConfig::from_toml_str(CONFIG).unwrap();
    let collector = OperationCollector::new(config.build_registry(), Arc::new(config.build_router().unwrap()));
    OperationsMiddleware::new(collector, Executor::new(runner), messenger)
}

fn user(pk: i64) -> Instance {
    Instance::new("users.User", pk).with_field("username", "rata_palida")
}

#[tokio::test]
async fn test_saved_twice_deleted_once_executes_one_delete() {
    let runner = Arc::new(CountingRunner::default());
    let messenger = Arc::new(CollectingMessenger::new());
    let middleware = middleware(runner.clone(), messenger.clone());

    let mut ctx = middleware.process_request(Request::new("POST", "/admin/users/user/1/delete/"));
    middleware.collect(&mut ctx, &Change::saved(user(1)));
    middleware.collect(&mut ctx, &Change::saved(user(1)));
    middleware.collect(&mut ctx, &Change::deleted(user(1)));

    let outcome = middleware.process_response(ctx, Response::new(302)).await;

    let logs = outcome.logs.expect("operations executed");
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].backend, "system-user");
    assert_eq!(logs[0].script, "userdel rata_palida");
    assert_eq!(logs[0].operations, vec!["system-user.delete(users.User#1)"]);
    assert_eq!(outcome.response.status, 302);

    let messages = messenger.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, MessageLevel::Success);
}

#[tokio::test]
async fn test_server_error_skips_execution() {
    let runner = Arc::new(CountingRunner::default());
    let messenger = Arc::new(CollectingMessenger::new());
    let middleware = middleware(runner.clone(), messenger.clone());

    let mut ctx = middleware.process_request(Request::new("POST", "/admin/users/user/add/"));
    middleware.collect(&mut ctx, &Change::saved(user(1)));
    let outcome = middleware.process_response(ctx, Response::new(500)).await;

    assert!(outcome.logs.is_none());
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    assert!(messenger.messages().is_empty());
}

#[tokio::test]
async fn test_nothing_pending_runs_nothing() {
    let runner = Arc::new(CountingRunner::default());
    let middleware = middleware(runner.clone(), Arc::new(CollectingMessenger::new()));

    let mut ctx = middleware.process_request(Request::new("POST", "/api/users/1/"));
    middleware.collect(&mut ctx, &Change::saved_fields(user(1), ["last_login"]));
    let outcome = middleware.process_response(ctx, Response::new(200)).await;

    assert!(outcome.logs.is_none());
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_reported_only_to_admin_users() {
    let runner = Arc::new(CountingRunner {
        failing_server: Some("mail"),
        ..CountingRunner::default()
    });
    let messenger = Arc::new(CollectingMessenger::new());
    let middleware = middleware(runner.clone(), messenger.clone());
    let with_mailbox = user(1).with_relation(
        "mailboxes",
        vec![Instance::new("mailboxes.Mailbox", 5).with_field("name", "rata")],
    );

    let mut ctx = middleware.process_request(Request::new("POST", "/api/users/1/"));
    middleware.collect(&mut ctx, &Change::saved(with_mailbox.clone()));
    let outcome = middleware.process_response(ctx, Response::new(200)).await;
    let logs = outcome.logs.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].state, LogState::Success);
    assert_eq!(logs[1].state, LogState::Failure);
    assert!(messenger.messages().is_empty());

    let mut ctx = middleware.process_request(Request::new("POST", "/admin/users/user/1/"));
    middleware.collect(&mut ctx, &Change::saved(with_mailbox));
    middleware.process_response(ctx, Response::new(200)).await;
    let messages = messenger.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert_eq!(messages[0].text, "1 out of 2 backends has failed to execute.");
}

#[tokio::test]
async fn test_replay_scenario_from_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("orchestra.toml");
    let scenario_path = temp_dir.path().join("scenario.toml");
    tokio::fs::write(&config_path, CONFIG).await?;
    tokio::fs::write(
        &scenario_path,
        r#"
[request]
path = "/admin/users/user/add/"

[[changes]]
kind = "saved"
[changes.instance]
model = "users.User"
pk = 3
fields = { username = "pangea" }

[[changes]]
kind = "saved"
update_fields = []
[changes.instance]
model = "users.User"
pk = 4
fields = { username = "orchestra" }
"#,
    )
    .await?;

    let config = OrchestraConfig::from_file(&config_path)?;
    let scenario = Scenario::from_file(&scenario_path)?;
    let runner = Arc::new(DryRunRunner::new());

    let report = app::replay(&config, &scenario, runner.clone()).await?;

    assert!(report.executed);
    assert_eq!(
        report.queued,
        vec!["system-user.save(users.User#3)", "system-user.save(users.User#4)"]
    );
    let scripts = runner.scripts();
    assert_eq!(scripts.len(), 1);
    assert_eq!(
        scripts[0].script,
        "id pangea || useradd pangea\nid orchestra || useradd orchestra"
    );
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].text, "1 backend has been executed.");
    Ok(())
}

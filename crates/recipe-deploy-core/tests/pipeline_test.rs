//! End-to-end tests for the deployment pipeline.
//!
//! The hosting API and every subprocess are replaced by fakes that record
//! into one shared history, so ordering across stages can be asserted:
//! 1. Config resolution (inline, file, broken)
//! 2. Label resolution (disabled, head ref, push event)
//! 3. Dependency install (absent, present, failing)
//! 4. Submission (unscoped, per recipe, fail fast, temp config file)

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_common::error::{DeployError, Result};
use recipe_deploy_common::types::{JobNameSuffix, JobResult, RecipeId};
use recipe_deploy_core::github::{Label, PullRequest, PullRequestSource};
use recipe_deploy_core::pipeline::{Deployer, PLANNED_CONFIG_ARG};
use recipe_deploy_core::process::{CommandOutput, CommandRunner, CommandSpec};

// ── Fakes ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Call {
    Http(String),
    Command {
        spec: CommandSpec,
        config_contents: Option<String>,
    },
}

type History = Rc<RefCell<Vec<Call>>>;

struct FakePulls {
    labels: Vec<&'static str>,
    history: History,
}

impl PullRequestSource for FakePulls {
    fn pulls_for_ref(&self, reference: &str) -> Result<Vec<PullRequest>> {
        self.history.borrow_mut().push(Call::Http(reference.to_owned()));
        Ok(vec![PullRequest {
            number: Some(42),
            labels: self
                .labels
                .iter()
                .map(|name| Label {
                    name: (*name).to_owned(),
                })
                .collect(),
        }])
    }
}

struct FakeRunner {
    install_exit_code: i32,
    bake_stdout: &'static str,
    fail_bake_for: Option<&'static str>,
    history: History,
}

impl FakeRunner {
    fn config_contents(spec: &CommandSpec) -> Option<String> {
        spec.args
            .iter()
            .find_map(|arg| arg.strip_prefix("-f="))
            .map(|path| std::fs::read_to_string(path).unwrap())
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        self.history.borrow_mut().push(Call::Command {
            spec: cmd.clone(),
            config_contents: Self::config_contents(cmd),
        });

        if cmd.args.iter().any(|a| a == "install") {
            return Ok(CommandOutput {
                stdout: "Collecting xarray".into(),
                stderr: "ERROR: could not install".into(),
                exit_code: self.install_exit_code,
            });
        }

        assert!(cmd.args.iter().any(|a| a == "bake"), "unexpected command: {cmd}");
        let fails = self
            .fail_bake_for
            .is_some_and(|id| cmd.args.contains(&format!("--Bake.recipe_id={id}")));
        if fails {
            return Ok(CommandOutput {
                stdout: String::new(),
                stderr: "bakery rejected job".into(),
                exit_code: 1,
            });
        }
        Ok(CommandOutput {
            stdout: format!("[I] Parsing recipes...\n{}\n", self.bake_stdout),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

struct Harness {
    workdir: tempfile::TempDir,
    settings: ActionSettings,
    labels: Vec<&'static str>,
    install_exit_code: i32,
    bake_stdout: &'static str,
    fail_bake_for: Option<&'static str>,
    history: History,
}

impl Harness {
    fn new(feedstock_files: &[&str]) -> Self {
        let workdir = tempfile::tempdir().unwrap();
        write_feedstock(workdir.path(), "feedstock", feedstock_files);
        let settings = ActionSettings {
            repository: "my/repo".into(),
            api_url: "https://api.github.com".into(),
            sha: "gfedcba".into(),
            head_ref: "abcdefg".into(),
            suffix: JobNameSuffix {
                repository_id: "1234567890".into(),
                run_id: "0987654321".into(),
                run_attempt: "1".into(),
            },
            config_source: r#"{"a": "b"}"#.into(),
            workdir: workdir.path().to_path_buf(),
            ..ActionSettings::default()
        };
        Self {
            workdir,
            settings,
            labels: vec!["run:my-recipe"],
            install_exit_code: 0,
            bake_stdout: r#"{"job_id": "foo", "job_name": "bar"}"#,
            fail_bake_for: None,
            history: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn deployer(&self) -> Deployer {
        Deployer::with_backends(
            self.settings.clone(),
            Box::new(FakePulls {
                labels: self.labels.clone(),
                history: Rc::clone(&self.history),
            }),
            Box::new(FakeRunner {
                install_exit_code: self.install_exit_code,
                bake_stdout: self.bake_stdout,
                fail_bake_for: self.fail_bake_for,
                history: Rc::clone(&self.history),
            }),
        )
    }

    fn http_calls(&self) -> Vec<String> {
        self.history
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Http(reference) => Some(reference.clone()),
                Call::Command { .. } => None,
            })
            .collect()
    }

    fn commands(&self) -> Vec<CommandSpec> {
        self.history
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Command { spec, .. } => Some(spec.clone()),
                Call::Http(_) => None,
            })
            .collect()
    }

    fn bakes(&self) -> Vec<CommandSpec> {
        self.commands()
            .into_iter()
            .filter(|c| c.args.iter().any(|a| a == "bake"))
            .collect()
    }
}

fn write_feedstock(root: &Path, subdir: &str, files: &[&str]) {
    let dir = root.join(subdir);
    std::fs::create_dir_all(&dir).unwrap();
    for file in files {
        std::fs::write(dir.join(file), "").unwrap();
    }
}

fn arg_with_prefix<'a>(cmd: &'a CommandSpec, prefix: &str) -> Option<&'a str> {
    cmd.args.iter().find_map(|a| a.strip_prefix(prefix))
}

// ── Label selection ──────────────────────────────────────────────────

#[test]
fn pipeline_without_label_selection_submits_everything_once() {
    let h = Harness::new(&["meta.yaml", "recipe.py"]);
    let reports = h.deployer().deploy().expect("deploy should succeed");

    assert!(h.http_calls().is_empty());
    let bakes = h.bakes();
    assert_eq!(bakes.len(), 1);
    assert!(arg_with_prefix(&bakes[0], "--Bake.recipe_id=").is_none());
    assert!(arg_with_prefix(&bakes[0], "--Bake.job_name=").is_none());
    assert_eq!(&bakes[0].args[..3], ["bake", "--repo=.", "--json"]);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].recipe, None);
    assert_eq!(reports[0].result.job_id.as_deref(), Some("foo"));
    assert_eq!(reports[0].result.job_name.as_deref(), Some("bar"));
}

#[test]
fn pipeline_label_selection_scopes_submission_to_recipe() {
    let mut h = Harness::new(&["meta.yaml", "recipe.py"]);
    h.settings.select_recipe_by_label = true;

    let reports = h.deployer().deploy().expect("deploy should succeed");

    assert_eq!(h.http_calls(), vec!["abcdefg".to_owned()]);
    let bakes = h.bakes();
    assert_eq!(bakes.len(), 1);
    assert_eq!(arg_with_prefix(&bakes[0], "--Bake.recipe_id="), Some("my-recipe"));
    let job_name = arg_with_prefix(&bakes[0], "--Bake.job_name=").unwrap();
    assert_eq!(job_name, "my-recipe-1234567890-0987654321-1");
    assert!(job_name.ends_with("-1234567890-0987654321-1"));
    assert_eq!(reports[0].recipe, Some(RecipeId::new("my-recipe")));
}

#[test]
fn pipeline_push_event_queries_by_sha() {
    let mut h = Harness::new(&[]);
    h.settings.select_recipe_by_label = true;
    h.settings.head_ref = String::new();

    let _ = h.deployer().deploy().expect("deploy should succeed");
    assert_eq!(h.http_calls(), vec!["gfedcba".to_owned()]);
}

#[test]
fn pipeline_submits_recipes_in_label_order() {
    let mut h = Harness::new(&[]);
    h.settings.select_recipe_by_label = true;
    h.labels = vec!["run:zeta", "bug", "run:Alpha_One"];

    let reports = h.deployer().deploy().expect("deploy should succeed");

    let ids: Vec<_> = h
        .bakes()
        .iter()
        .map(|b| arg_with_prefix(b, "--Bake.recipe_id=").unwrap().to_owned())
        .collect();
    assert_eq!(ids, vec!["zeta", "Alpha_One"]);
    assert_eq!(
        arg_with_prefix(&h.bakes()[1], "--Bake.job_name="),
        Some("alpha-one-1234567890-0987654321-1")
    );
    assert_eq!(reports.len(), 2);
}

#[test]
fn pipeline_label_selection_without_run_labels_submits_everything() {
    let mut h = Harness::new(&[]);
    h.settings.select_recipe_by_label = true;
    h.labels = vec!["documentation"];

    let _ = h.deployer().deploy().expect("deploy should succeed");
    let bakes = h.bakes();
    assert_eq!(bakes.len(), 1);
    assert!(arg_with_prefix(&bakes[0], "--Bake.recipe_id=").is_none());
}

// ── Dependency install ───────────────────────────────────────────────

#[test]
fn pipeline_installs_requirements_before_submitting() {
    let h = Harness::new(&["meta.yaml", "recipe.py", "requirements.txt"]);
    let _ = h.deployer().deploy().expect("deploy should succeed");

    let commands = h.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(
        commands[0].to_string(),
        "python3 -m pip install -Ur feedstock/requirements.txt"
    );
    assert!(commands[1].args.iter().any(|a| a == "bake"));
}

#[test]
fn pipeline_install_uses_conda_env_when_set() {
    let mut h = Harness::new(&["requirements.txt"]);
    h.settings.conda_env = Some("notebook".into());
    let _ = h.deployer().deploy().expect("deploy should succeed");

    assert_eq!(
        h.commands()[0].to_string(),
        "mamba run -n notebook pip install -Ur feedstock/requirements.txt"
    );
}

#[test]
fn pipeline_failed_install_never_bakes() {
    let mut h = Harness::new(&["meta.yaml", "recipe.py", "requirements.txt"]);
    h.install_exit_code = 1;
    h.settings.select_recipe_by_label = true;

    let err = h.deployer().deploy().unwrap_err();
    assert!(matches!(err, DeployError::DependencyInstall { .. }), "got: {err}");
    assert!(err.to_string().contains("could not install"));
    assert_eq!(h.commands().len(), 1);
    assert!(h.bakes().is_empty());
}

#[test]
fn pipeline_feedstock_subdir_override_from_config_file() {
    let mut h = Harness::new(&[]);
    write_feedstock(h.workdir.path(), "recipes", &["requirements.txt"]);
    let config_path = h.workdir.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{"BaseCommand": {"feedstock_subdir": "recipes"}}"#,
    )
    .unwrap();
    h.settings.config_source = config_path.to_string_lossy().into_owned();

    let _ = h.deployer().deploy().expect("deploy should succeed");
    assert_eq!(
        h.commands()[0].args.last().map(String::as_str),
        Some("recipes/requirements.txt")
    );
}

// ── Config ───────────────────────────────────────────────────────────

#[test]
fn pipeline_broken_inline_config_does_nothing() {
    let mut h = Harness::new(&["requirements.txt"]);
    h.settings.select_recipe_by_label = true;
    h.settings.config_source = "{broken: json}".into();

    let err = h.deployer().deploy().unwrap_err();
    assert!(matches!(err, DeployError::ConfigInline { .. }), "got: {err}");
    assert!(h.history.borrow().is_empty());
}

#[test]
fn pipeline_missing_config_path_is_config_error() {
    let mut h = Harness::new(&[]);
    h.settings.config_source = "non/existent/path.json".into();

    let err = h.deployer().deploy().unwrap_err();
    assert!(matches!(err, DeployError::ConfigInline { .. }), "got: {err}");
    assert!(h.bakes().is_empty());
}

#[test]
fn pipeline_relative_config_path_resolves_in_workdir() {
    let mut h = Harness::new(&[]);
    std::fs::write(
        h.workdir.path().join("runner-config.json"),
        r#"{"a": "from-workdir"}"#,
    )
    .unwrap();
    h.settings.config_source = "runner-config.json".into();

    let _ = h.deployer().deploy().expect("deploy should succeed");

    let history = h.history.borrow();
    let Some(Call::Command {
        config_contents: Some(contents),
        ..
    }) = history.last()
    else {
        panic!("expected a bake with a readable config file");
    };
    let parsed: serde_json::Value = serde_json::from_str(contents).unwrap();
    assert_eq!(parsed["a"], "from-workdir");
}

#[test]
fn pipeline_directory_config_source_is_config_error() {
    let mut h = Harness::new(&[]);
    h.settings.config_source = "feedstock".into();

    let err = h.deployer().deploy().unwrap_err();
    assert!(matches!(err, DeployError::ConfigFileRead { .. }), "got: {err}");
    assert!(h.history.borrow().is_empty());
}

// ── Submission ───────────────────────────────────────────────────────

#[test]
fn pipeline_backend_without_job_id_reports_unavailable() {
    let mut h = Harness::new(&[]);
    h.bake_stdout = "{}";

    let reports = h.deployer().deploy().expect("deploy should succeed");
    assert_eq!(reports[0].result, JobResult::default());
}

#[test]
fn pipeline_config_file_lives_only_during_submission() {
    let mut h = Harness::new(&[]);
    h.settings.select_recipe_by_label = true;
    h.labels = vec!["run:a", "run:b"];

    let _ = h.deployer().deploy().expect("deploy should succeed");

    let history = h.history.borrow();
    let mut paths = Vec::new();
    for call in history.iter() {
        if let Call::Command {
            spec,
            config_contents,
        } = call
        {
            let contents = config_contents.as_deref().expect("config readable during bake");
            let parsed: serde_json::Value = serde_json::from_str(contents).unwrap();
            assert_eq!(parsed["a"], "b");
            paths.push(arg_with_prefix(spec, "-f=").unwrap().to_owned());
        }
    }
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0], paths[1], "one config file per run");
    assert!(!Path::new(&paths[0]).exists(), "config file removed after run");
}

#[test]
fn pipeline_failed_submission_stops_remaining_recipes() {
    let mut h = Harness::new(&[]);
    h.settings.select_recipe_by_label = true;
    h.labels = vec!["run:a", "run:b", "run:c"];
    h.fail_bake_for = Some("b");

    let err = h.deployer().deploy().unwrap_err();
    assert!(matches!(err, DeployError::Submission { .. }), "got: {err}");
    assert!(err.to_string().contains("bakery rejected job"));
    assert_eq!(h.bakes().len(), 2);
}

#[test]
fn pipeline_failed_submission_removes_config_file() {
    let mut h = Harness::new(&[]);
    h.bake_stdout = "not json at all";

    let err = h.deployer().deploy().unwrap_err();
    assert!(matches!(err, DeployError::MalformedOutput { .. }), "got: {err}");
    let path = arg_with_prefix(&h.bakes()[0], "-f=").unwrap().to_owned();
    assert!(!Path::new(&path).exists());
}

// ── Plan ─────────────────────────────────────────────────────────────

#[test]
fn plan_runs_nothing() {
    let mut h = Harness::new(&["requirements.txt"]);
    h.settings.select_recipe_by_label = true;

    let plan = h.deployer().plan().expect("plan should succeed");

    assert!(h.commands().is_empty());
    assert_eq!(h.http_calls().len(), 1);
    assert!(plan.install.is_some());
    assert_eq!(plan.recipes, vec![RecipeId::new("my-recipe")]);
    assert_eq!(plan.submissions.len(), 1);
    assert_eq!(
        arg_with_prefix(&plan.submissions[0].command, "-f="),
        Some(PLANNED_CONFIG_ARG)
    );
}

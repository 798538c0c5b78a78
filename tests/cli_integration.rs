#[allow(deprecated)]
use assert_cmd::Command;
use chrono::NaiveDate;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;
use tasktime::db::achievement_repo::{self, DailyTimes};
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        std::process::Command::new("git")
            .args(["init"])
            .current_dir(dir.path())
            .output()
            .expect("git init");
        Self { dir }
    }

    fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("tasktime").expect("binary");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("TASKTIME_LOG");
        cmd
    }

    fn run_json_with_stdin(&self, args: &[&str], stdin: &str) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).write_stdin(stdin).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_json(&self, args: &[&str]) -> Value {
        self.run_json_with_stdin(args, "")
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn add_ticket(&self, title: &str) -> String {
        let v = self.run_ok(&["ticket", "add", title]);
        v["data"]["ticket"]["id"].as_str().unwrap().to_string()
    }

    fn add_task(&self, ticket: &str, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["task", "add", title, "--ticket", ticket];
        args.extend_from_slice(extra);
        let v = self.run_ok(&args);
        v["data"]["task"]["id"].as_str().unwrap().to_string()
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join(".worktoolai").join("tasktime").join("tasktime.db")
    }

    fn show(&self, task: &str) -> Value {
        self.run_ok(&["task", "show", task])["data"].clone()
    }
}

fn setup() -> (TestEnv, String) {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let ticket = env.add_ticket("Release 1.0");
    (env, ticket)
}

fn assert_code(v: &Value, code: &str) {
    assert_eq!(v["error"]["code"], code, "unexpected error: {v}");
}

// ─── 1. init ───────────────────────────────────────────────────────

#[test]
fn test_init() {
    let env = TestEnv::new();
    let v = env.run_ok(&["init"]);
    let path = v["data"]["path"].as_str().unwrap();
    assert!(path.ends_with(".worktoolai/tasktime/tasktime.db"));
    assert!(PathBuf::from(path).exists());
}

#[test]
fn test_init_idempotent() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.run_ok(&["init"]);
    assert!(v["data"]["path"].as_str().unwrap().contains("tasktime.db"));
}

#[test]
fn test_init_required_before_commands() {
    let env = TestEnv::new();
    let v = env.run_err(&["ticket", "list"]);
    assert_code(&v, "NOT_INITIALIZED");
}

#[test]
fn test_text_errors_go_to_stderr_with_exit_1() {
    let env = TestEnv::new();
    env.cmd()
        .args(["ticket", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not initialized"));
}

// ─── 2. tickets ────────────────────────────────────────────────────

#[test]
fn test_ticket_add_and_list() {
    let (env, ticket) = setup();
    env.add_ticket("Release 1.1");
    let task = env.add_task(&ticket, "write docs", &[]);
    env.run_ok(&["task", "update", &task, "--status", "done"]);

    let v = env.run_ok(&["ticket", "list"]);
    let tickets = v["data"]["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0]["title"], "Release 1.0");
    assert_eq!(tickets[0]["status"], "open");
    assert_eq!(tickets[0]["progress"]["total"], 1);
    assert_eq!(tickets[0]["progress"]["done"], 1);
    assert_eq!(tickets[1]["progress"]["total"], 0);
}

#[test]
fn test_ticket_close_and_reopen() {
    let (env, ticket) = setup();
    let v = env.run_ok(&["ticket", "close", &ticket]);
    assert_eq!(v["data"]["ticket"]["status"], "done");
    let v = env.run_ok(&["ticket", "reopen", &ticket[..20]]);
    assert_eq!(v["data"]["ticket"]["status"], "open");
    assert_code(&env.run_err(&["ticket", "close", "nope"]), "TICKET_NOT_FOUND");
}

#[test]
fn test_ticket_text_list() {
    let (env, _) = setup();
    env.cmd()
        .args(["ticket", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Release 1.0"));
}

// ─── 3. task add / tree / show ─────────────────────────────────────

#[test]
fn test_task_add_defaults() {
    let (env, ticket) = setup();
    let v = env.run_ok(&["task", "add", "investigate", "--ticket", &ticket]);
    let task = &v["data"]["task"];
    assert_eq!(task["status"], "todo");
    assert_eq!(task["type"], "first_pass");
    assert_eq!(task["is_survey_task"], true);
    assert_eq!(task["progress_rate"], 0);
    assert_eq!(task["done_time_rate"], 0);
    assert_eq!(task["achievement"]["operating_time"], 0);
    assert!(task["plan"]["predicted_required_time_first"].is_null());
    assert!(task["check"]["id"].is_string());
    assert!(task["feedback"]["id"].is_string());
}

#[test]
fn test_task_add_validation() {
    let (env, ticket) = setup();
    assert_code(&env.run_err(&["task", "add", "  ", "--ticket", &ticket]), "VALIDATION_ERROR");
    assert_code(&env.run_err(&["task", "add", "x", "--ticket", "ZZZZ"]), "TICKET_NOT_FOUND");
    assert_code(
        &env.run_err(&["task", "add", "x", "--ticket", &ticket, "--operating"]),
        "VALIDATION_ERROR",
    );
    assert_code(
        &env.run_err(&["task", "add", "x", "--ticket", &ticket, "--predict-first=-1"]),
        "VALIDATION_ERROR",
    );

    let v = env.run_ok(&["task", "add", "build", "--ticket", &ticket, "--operating", "--predict-first", "2"]);
    assert_eq!(v["data"]["task"]["is_survey_task"], false);
    assert_eq!(v["data"]["task"]["plan"]["predicted_required_time_first"], 2.0);
}

#[test]
fn test_tree_nests_children_and_hides_done() {
    let (env, ticket) = setup();
    let root = env.add_task(&ticket, "root", &[]);
    let child = env.add_task(&ticket, "child", &["--parent", &root]);
    env.add_task(&ticket, "grandchild", &["--parent", &child]);
    let other = env.add_task(&ticket, "other root", &[]);
    env.run_ok(&["task", "update", &other, "--status", "done"]);

    let v = env.run_ok(&["task", "tree", "--ticket", &ticket]);
    let tasks = v["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "root");
    assert_eq!(tasks[0]["children"][0]["title"], "child");
    assert_eq!(tasks[0]["children"][0]["children"][0]["title"], "grandchild");
    assert_eq!(v["data"]["progress"]["total"], 4);
    assert_eq!(v["data"]["progress"]["done"], 1);
}

#[test]
fn test_tree_text_output() {
    let (env, ticket) = setup();
    let root = env.add_task(&ticket, "root task", &[]);
    env.add_task(&ticket, "child task", &["--parent", &root]);
    env.cmd()
        .args(["task", "tree", "--ticket", &ticket])
        .assert()
        .success()
        .stdout(predicate::str::contains("root task"))
        .stdout(predicate::str::contains("    [todo] child task"));
}

#[test]
fn test_split_creates_children_with_predictions() {
    let (env, ticket) = setup();
    let parent = env.add_task(&ticket, "feature", &[]);
    let v = env.run_ok(&["task", "split", &parent, "read code=1.5", "write tests=2", "cleanup"]);
    let tasks = v["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().all(|t| t["parent_id"] == parent.as_str()));

    let show = env.show(&parent);
    let children = show["task"]["children"].as_array().unwrap();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0]["plan"]["predicted_required_time_first"], 1.5);
    assert!(children[2]["plan"]["predicted_required_time_first"].is_null());
}

#[test]
fn test_prefix_reference_and_ambiguity() {
    let (env, ticket) = setup();
    let a = env.add_task(&ticket, "a", &[]);
    env.add_task(&ticket, "b", &[]);

    let v = env.show(&a[..20]);
    assert_eq!(v["task"]["id"], a.as_str());

    // ULIDs created together share their leading timestamp characters
    assert_code(&env.run_err(&["task", "show", &a[..1]]), "AMBIGUOUS_REF");
    assert_code(&env.run_err(&["task", "show", "nope"]), "TASK_NOT_FOUND");
}

// ─── 4. task update ────────────────────────────────────────────────

#[test]
fn test_update_fields() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "draft", &[]);
    let v = env.run_ok(&[
        "task", "update", &task,
        "--title", "final",
        "--type", "post-survey",
        "--status", "running",
        "--progress-rate", "40",
        "--predict-first", "1",
        "--predict-final", "1.5",
        "--survey-detail", "read the old importer",
    ]);
    let t = &v["data"]["task"];
    assert_eq!(t["title"], "final");
    assert_eq!(t["type"], "post_survey");
    assert_eq!(t["status"], "running");
    assert_eq!(t["progress_rate"], 40);
    assert_eq!(t["plan"]["predicted_required_time_final"], 1.5);
    assert_eq!(t["plan"]["survey_detail"], "read the old importer");

    // untouched plan fields survive a later partial update
    let v = env.run_ok(&["task", "update", &task, "--predict-survey-first", "0.5"]);
    assert_eq!(v["data"]["task"]["plan"]["predicted_required_time_first"], 1.0);
    assert_eq!(v["data"]["task"]["plan"]["predicted_survey_time_first"], 0.5);
}

#[test]
fn test_update_validation() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    assert_code(&env.run_err(&["task", "update", &task]), "VALIDATION_ERROR");
    assert_code(&env.run_err(&["task", "update", &task, "--progress-rate", "101"]), "VALIDATION_ERROR");
    assert_code(&env.run_err(&["task", "update", &task, "--title", ""]), "VALIDATION_ERROR");
    assert_code(
        &env.run_err(&["task", "update", &task, "--operating-time=-5", "--survey-time", "0"]),
        "VALIDATION_ERROR",
    );
}

#[test]
fn test_done_status_stamps_and_clears_done_at() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    let v = env.run_ok(&["task", "update", &task, "--status", "done"]);
    assert!(v["data"]["task"]["achievement"]["done_at"].is_string());

    let v = env.run_ok(&["task", "update", &task, "--status", "pending"]);
    assert!(v["data"]["task"]["achievement"]["done_at"].is_null());
}

#[test]
fn test_mode_switch_needs_first_prediction() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    assert_code(&env.run_err(&["task", "update", &task, "--mode", "operating"]), "VALIDATION_ERROR");

    let v = env.run_ok(&["task", "update", &task, "--mode", "operating", "--predict-first", "3"]);
    assert_eq!(v["data"]["task"]["is_survey_task"], false);

    let v = env.run_ok(&["task", "update", &task, "--mode", "survey"]);
    assert_eq!(v["data"]["task"]["is_survey_task"], true);
}

#[test]
fn test_manual_times_upsert_todays_history() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &["--predict-first", "1"]);

    let v = env.run_ok(&["task", "update", &task, "--operating-time", "1800", "--survey-time", "0"]);
    assert_eq!(v["data"]["history"], "created");
    assert_eq!(v["data"]["task"]["done_time_rate"], 50);

    let v = env.run_ok(&["task", "update", &task, "--operating-time", "1800", "--survey-time", "1800"]);
    assert_eq!(v["data"]["history"], "updated");
    let t = &v["data"]["task"];
    assert_eq!(t["done_time_rate"], 100);
    assert_eq!(t["achievement"]["survey_time"], 1800);
    assert_eq!(t["achievement"]["histories"].as_array().unwrap().len(), 1);
    assert_eq!(t["achievement"]["histories"][0]["survey_time"], 1800);
}

#[test]
fn test_manual_times_cannot_undercut_earlier_days() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &["--predict-first", "1"]);
    {
        let conn = rusqlite::Connection::open(env.db_path()).unwrap();
        achievement_repo::upsert_daily(
            &conn,
            &task,
            &DailyTimes {
                day: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                cumulative_operating: 3600,
                cumulative_survey: 0,
                day_operating: 3600,
                day_survey: 0,
            },
        )
        .unwrap();
    }

    let v = env.run_err(&["task", "update", &task, "--operating-time", "600", "--survey-time", "0"]);
    assert_code(&v, "VALIDATION_ERROR");

    let achievement = env.show(&task)["task"]["achievement"].clone();
    let history_sum: i64 = achievement["histories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["operating_time"].as_i64().unwrap())
        .sum();
    assert_eq!(achievement["operating_time"], 3600);
    assert_eq!(history_sum, 3600);

    // raising the total only touches today's row
    let v = env.run_ok(&["task", "update", &task, "--operating-time", "4000", "--survey-time", "0"]);
    assert_eq!(v["data"]["history"], "created");
    let histories = v["data"]["task"]["achievement"]["histories"].as_array().unwrap().clone();
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[1]["operating_time"], 400);
    assert_eq!(v["data"]["task"]["achievement"]["operating_time"], 4000);
}

#[test]
fn test_show_gauge_and_assessment() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &["--predict-first", "1"]);
    env.run_ok(&[
        "task", "update", &task,
        "--operating-time", "5400", "--survey-time", "0",
        "--progress-rate", "60",
    ]);
    let v = env.show(&task);
    assert_eq!(v["gauge"]["done_time_rate"], 150);
    assert_eq!(v["gauge"]["secondary"]["value"], 150);
    assert_eq!(v["gauge"]["secondary"]["safe_limit"], 60);
    assert!(v["gauge"]["primary_danger_limit"].is_null());
    assert_eq!(v["task"]["assessment"], "over_estimate");

    let fresh = env.add_task(&ticket, "fresh", &[]);
    let v = env.show(&fresh);
    assert_eq!(v["gauge"]["primary_danger_limit"], 0);
    assert!(v["gauge"]["secondary"].is_null());
    assert_eq!(v["task"]["assessment"], "no_prediction");
}

// ─── 5. parent validation ──────────────────────────────────────────

#[test]
fn test_parent_cycle_rejected() {
    let (env, ticket) = setup();
    let a = env.add_task(&ticket, "a", &[]);
    let b = env.add_task(&ticket, "b", &["--parent", &a]);
    let c = env.add_task(&ticket, "c", &["--parent", &b]);

    assert_code(&env.run_err(&["task", "update", &a, "--parent", &c]), "INVALID_PARENT");
    assert_code(&env.run_err(&["task", "update", &a, "--parent", &a]), "INVALID_PARENT");

    // detaching and re-parenting elsewhere is fine
    env.run_ok(&["task", "update", &c, "--parent", "none"]);
    env.run_ok(&["task", "update", &a, "--parent", &c]);
}

#[test]
fn test_depth_limit() {
    let (env, ticket) = setup();
    let mut parent = env.add_task(&ticket, "level 1", &[]);
    for level in 2..=6 {
        parent = env.add_task(&ticket, &format!("level {level}"), &["--parent", &parent]);
    }
    let v = env.run_err(&["task", "add", "level 7", "--ticket", &ticket, "--parent", &parent]);
    assert_code(&v, "INVALID_PARENT");
}

#[test]
fn test_cross_ticket_parent_rejected() {
    let (env, ticket) = setup();
    let other = env.add_ticket("Other");
    let foreign = env.add_task(&other, "foreign", &[]);
    let v = env.run_err(&["task", "add", "x", "--ticket", &ticket, "--parent", &foreign]);
    assert_code(&v, "INVALID_PARENT");
}

#[test]
fn test_move_to_other_ticket_takes_subtree() {
    let (env, ticket) = setup();
    let other = env.add_ticket("Other");
    let root = env.add_task(&ticket, "root", &[]);
    let child = env.add_task(&ticket, "child", &["--parent", &root]);

    env.run_ok(&["task", "update", &root, "--ticket", &other]);
    let v = env.show(&child);
    assert_eq!(v["task"]["ticket_id"], other.as_str());

    let tree = env.run_ok(&["task", "tree", "--ticket", &other]);
    assert_eq!(tree["data"]["tasks"][0]["children"][0]["title"], "child");
    let old = env.run_ok(&["task", "tree", "--ticket", &ticket]);
    assert!(old["data"]["tasks"].as_array().unwrap().is_empty());
}

// ─── 6. config ─────────────────────────────────────────────────────

#[test]
fn test_config_defaults_and_set() {
    let (env, _) = setup();
    let v = env.run_ok(&["config", "show"]);
    assert_eq!(v["data"]["config"]["operating-minutes"], 25);
    assert_eq!(v["data"]["config"]["rest-minutes"], 5);

    env.run_ok(&["config", "set", "operating-minutes", "50"]);
    let v = env.run_ok(&["config", "show"]);
    assert_eq!(v["data"]["config"]["operating-minutes"], 50);

    assert_code(&env.run_err(&["config", "set", "rest-minutes", "0"]), "CONFIG_ERROR");
    assert_code(&env.run_err(&["config", "set", "volume", "3"]), "CONFIG_ERROR");
}

// ─── 7. track / term ───────────────────────────────────────────────

#[test]
fn test_track_paused_session_accrues_nothing() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    let v = env.run_json(&["track", &task, "--seconds", "1"]);
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["data"]["elapsed_secs"], 0);
    assert_eq!(v["data"]["tasks"][0]["survey_time"], 0);
    assert_eq!(v["data"]["writes"]["failures"], 0);
    assert_eq!(v["data"]["writes"]["created"], 0);

    let show = env.show(&task);
    assert!(show["task"]["achievement"]["histories"].as_array().unwrap().is_empty());
}

#[test]
fn test_track_autostart_records_time_and_term() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    let v = env.run_json(&["track", &task, "--seconds", "2", "--autostart"]);
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["data"]["elapsed_secs"], 2);
    assert_eq!(v["data"]["tasks"][0]["survey_time"], 2);
    assert_eq!(v["data"]["writes"]["created"], 1);

    let show = env.show(&task);
    assert_eq!(show["task"]["achievement"]["survey_time"], 2);
    assert_eq!(show["task"]["achievement"]["histories"].as_array().unwrap().len(), 1);

    let terms = env.run_ok(&["term", "list", &task, "--all"]);
    assert_eq!(terms["data"]["terms"].as_array().unwrap().len(), 1);
}

#[test]
fn test_track_quit_from_stdin() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    let v = env.run_json_with_stdin(&["track", &task], "start\nbogus\nquit\n");
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["data"]["elapsed_secs"], 0);
}

#[test]
fn test_track_unknown_task() {
    let (env, _) = setup();
    let v = env.run_json(&["track", "ZZZZ", "--seconds", "1"]);
    assert_code(&v, "TASK_NOT_FOUND");
}

#[test]
fn test_term_list_empty() {
    let (env, ticket) = setup();
    let task = env.add_task(&ticket, "t", &[]);
    let v = env.run_ok(&["term", "list", &task]);
    assert!(v["data"]["terms"].as_array().unwrap().is_empty());
    assert_eq!(v["data"]["total_secs"], 0);
}

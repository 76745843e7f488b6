//! Binary integration tests.
//!
//! Drive the `cellar` executable against an isolated config, an age identity
//! generated on first `init`, and the noop versioning backend.

mod support;

use std::fs;

use predicates::prelude::*;
use support::*;

#[test]
fn test_init_generates_identity_and_store() {
    let t = Test::new();
    let output = t.init_cmd(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "generated identity age1");
    assert_stdout_contains(&output, "initialized store at");

    assert!(t.identity_path().is_file());
    let recipients = fs::read_to_string(t.store_path().join(".age-recipients")).unwrap();
    assert_eq!(recipients.lines().count(), 1);
    assert!(recipients.starts_with("age1"));
}

#[test]
fn test_init_reuses_identity() {
    let t = Test::init();
    let identity = fs::read_to_string(t.identity_path()).unwrap();

    let output = t.init_cmd(&[]);
    assert_success(&output);
    assert!(!stdout(&output).contains("generated identity"));
    assert_eq!(fs::read_to_string(t.identity_path()).unwrap(), identity);
}

#[test]
fn test_init_with_explicit_recipients() {
    let t = Test::new();
    let output = t.init_cmd(&[BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert_stdout_contains(&output, BOB_PUBLIC_KEY);

    let recipients = fs::read_to_string(t.store_path().join(".age-recipients")).unwrap();
    assert_eq!(recipients, format!("{}\n", BOB_PUBLIC_KEY));
}

#[test]
fn test_insert_and_show() {
    let t = Test::init();
    let output = t.insert("web/github", "gh-token-123");
    assert_success(&output);
    assert_stdout_contains(&output, "saved web/github");
    assert!(t.store_path().join("web/github.age").is_file());

    let output = t.show("web/github");
    assert_success(&output);
    assert_eq!(stdout(&output), "gh-token-123\n");
}

#[test]
fn test_insert_multiline_and_show_password() {
    let t = Test::init();
    t.cmd()
        .args(["insert", "-m", "db/postgres"])
        .write_stdin("s3cret\nuser: admin\nhost is local\n")
        .assert()
        .success();

    t.cmd()
        .args(["show", "db/postgres"])
        .assert()
        .success()
        .stdout("s3cret\nuser: admin\nhost is local\n");

    t.cmd()
        .args(["show", "-p", "db/postgres"])
        .assert()
        .success()
        .stdout("s3cret\n");
}

#[test]
fn test_ls_sorted() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let output = t.ls();
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "db/postgres\nemail\nweb/github\nweb/gitlab\n"
    );

    t.cmd()
        .args(["ls", "web"])
        .assert()
        .success()
        .stdout("web/github\nweb/gitlab\n");
}

#[test]
fn test_ls_empty() {
    let t = Test::init();
    t.cmd()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("no entries"));
}

#[test]
fn test_ls_json() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let output = t.ls_json();
    assert_success(&output);

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["count"], 4);
    assert_eq!(value["entries"][0], "db/postgres");
    assert_eq!(value["entries"][3], "web/gitlab");
}

#[test]
fn test_rm() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    assert_success(&t.rm("email"));
    assert!(!stdout(&t.ls()).contains("email"));

    let output = t.rm("email");
    assert_failure(&output);
    assert_stderr_contains(&output, "secret not found: email");
}

#[test]
fn test_rm_recursive() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    t.cmd().args(["rm", "-r", "web"]).assert().success();
    assert_eq!(stdout(&t.ls()), "db/postgres\nemail\n");
}

#[test]
fn test_mv_and_cp() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    t.cmd()
        .args(["mv", "email", "personal/email"])
        .assert()
        .success()
        .stdout(predicate::str::contains("moved email to personal/email"));
    t.cmd().args(["cp", "web", "backup/web"]).assert().success();

    assert_eq!(
        stdout(&t.ls()),
        "backup/web/github\nbackup/web/gitlab\ndb/postgres\npersonal/email\nweb/github\nweb/gitlab\n"
    );
    assert_eq!(stdout(&t.show("backup/web/github")), "gh-token-123\n");
}

#[test]
fn test_show_missing() {
    let t = Test::init();
    let output = t.show("nope");
    assert_failure(&output);
    assert_stderr_contains(&output, "secret not found: nope");
    assert_stderr_contains(&output, "cellar ls");
}

#[test]
fn test_invalid_name_hint() {
    let t = Test::init();
    let output = t.insert("../escape", "x");
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid secret name");
    assert_stderr_contains(&output, "names are slash-separated");
}

#[test]
fn test_without_store() {
    let t = Test::init();
    let output = t
        .cmd()
        .arg("--store")
        .arg(t.dir.path().join("missing"))
        .arg("ls")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "store root is not a directory");
}

#[test]
fn test_recipients_list() {
    let t = Test::init();
    let output = t.recipients(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "Recipients for store root");
    assert_stdout_contains(&output, "age1");
}

#[test]
fn test_recipients_add_and_rm() {
    let t = Test::with_entries(STANDARD_ENTRIES);

    let output = t.recipients(&["add", BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert_stdout_contains(&output, "re-encrypted 4 of 4 entries");
    assert!(t
        .store_path()
        .join(".public-keys")
        .join(BOB_PUBLIC_KEY)
        .is_file());
    assert_stdout_contains(&t.recipients(&["list"]), BOB_PUBLIC_KEY);

    // we still hold a key for every entry
    assert_eq!(stdout(&t.show("email")), "hunter2\n");

    let output = t.recipients(&["add", BOB_PUBLIC_KEY]);
    assert_failure(&output);
    assert_stderr_contains(&output, "recipient already present");

    let output = t.recipients(&["rm", BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert!(!stdout(&t.recipients(&["list"])).contains(BOB_PUBLIC_KEY));
}

#[test]
fn test_recipients_add_scoped() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let ours = fs::read_to_string(t.store_path().join(".age-recipients")).unwrap();
    fs::write(t.store_path().join("web/.age-recipients"), &ours).unwrap();

    let output = t.recipients(&["add", "--subtree", "web", BOB_PUBLIC_KEY]);
    assert_success(&output);
    assert_stdout_contains(&output, "re-encrypted 2 of 2 entries");

    assert_stdout_contains(&t.recipients(&["list", "web/github"]), BOB_PUBLIC_KEY);
    assert!(!stdout(&t.recipients(&["list", "email"])).contains(BOB_PUBLIC_KEY));
}

#[test]
fn test_recipients_rm_last_refused() {
    let t = Test::init();
    let ours = fs::read_to_string(t.store_path().join(".age-recipients")).unwrap();
    let output = t.recipients(&["rm", ours.trim()]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no recipients");
}

#[test]
fn test_reencrypt() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    t.cmd()
        .arg("reencrypt")
        .assert()
        .success()
        .stdout(predicate::str::contains("re-encrypted 4 of 4 entries"));
    t.cmd()
        .args(["reencrypt", "db"])
        .assert()
        .success()
        .stdout(predicate::str::contains("re-encrypted 1 of 1 entries"));
}

#[test]
fn test_import_keys() {
    let t = Test::init();
    let keys = t.store_path().join(".public-keys");
    fs::write(keys.join(BOB_PUBLIC_KEY), format!("{}\n", BOB_PUBLIC_KEY)).unwrap();
    let ours = fs::read_to_string(t.store_path().join(".age-recipients")).unwrap();
    fs::write(
        t.store_path().join(".age-recipients"),
        format!("{}{}\n", ours, BOB_PUBLIC_KEY),
    )
    .unwrap();

    t.cmd()
        .arg("import-keys")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("imported {}", BOB_PUBLIC_KEY)));

    let keyring = fs::read_to_string(t.home.path().join("keyring.txt")).unwrap();
    assert!(keyring.contains(BOB_PUBLIC_KEY));

    t.cmd()
        .arg("import-keys")
        .assert()
        .success()
        .stdout(predicate::str::contains("all recipient keys already known"));
}

#[test]
fn test_version() {
    let t = Test::init();
    t.cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "cellar {}",
            env!("CARGO_PKG_VERSION")
        )))
        .stdout(predicate::str::contains("age 1.0.0"))
        .stdout(predicate::str::contains("noop"));
}

#[test]
fn test_completions() {
    let t = Test::new();
    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cellar"));
}

#[test]
fn test_verbose_flag_shows_debug_output() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let output = t.cmd().args(["--verbose", "ls"]).output().unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "DEBUG");
}

#[test]
fn test_default_no_log_output() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let output = t.ls();
    assert_success(&output);
    let err = stderr(&output);
    assert!(
        !err.contains("DEBUG") && !err.contains("TRACE"),
        "default mode should not show debug/trace output: {}",
        err
    );
}

#[test]
fn test_log_env_var() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let output = t
        .cmd()
        .env("CELLAR_LOG", "cellar=trace")
        .arg("ls")
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "TRACE");
}

#[test]
fn test_store_flag_overrides_config() {
    let t = Test::with_entries(STANDARD_ENTRIES);
    let other = t.dir.path().join("elsewhere");
    fs::create_dir_all(&other).unwrap();

    t.cmd()
        .args(["--store"])
        .arg(&other)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("no entries"));
}

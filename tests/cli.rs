//! Runs the `envmod` front end against a shell script posing as `modulecmd`.
#![cfg(unix)]

mod common;

use clap::Parser;
use common::write_script;
use envmod::cli::{self, Cli};
use std::fs;
use tempfile::TempDir;

fn run(dir: &TempDir, tool: &std::path::Path, extra: &[&str], request: &[&str]) -> (i32, String) {
    let config = dir.path().join("config.toml");
    if !config.exists() {
        fs::write(&config, "echo_stderr = false\n").unwrap();
    }

    let mut argv = vec![
        "envmod".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--modulecmd".to_string(),
        tool.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    argv.extend(request.iter().map(|s| s.to_string()));

    let mut out = Vec::new();
    let status = cli::run(&Cli::parse_from(argv), &mut out).unwrap();
    (status, String::from_utf8(out).unwrap())
}

#[test]
fn prints_changes_for_a_successful_load() {
    let dir = TempDir::new().unwrap();
    let tool = write_script(dir.path(), "modulecmd", "echo \"os.environ['LOADED'] = '$3'\"\n");

    let (status, out) = run(&dir, &tool, &["--no-startup", "--shell", "sh"], &["load", "gcc/7.3.0"]);
    assert_eq!(status, 0);
    assert_eq!(out, "export LOADED='gcc/7.3.0'\n");
}

#[test]
fn failure_status_becomes_the_exit_code() {
    let dir = TempDir::new().unwrap();
    let tool = write_script(
        dir.path(),
        "modulecmd",
        "echo \"ERROR: Unable to locate a modulefile for '$3'\" >&2\nexit 1\n",
    );

    let (status, out) = run(&dir, &tool, &["--shell", "sh"], &["load", "nope"]);
    assert_eq!(status, 1);
    assert_eq!(out, "");
}

#[test]
fn startup_commands_run_first() {
    let dir = TempDir::new().unwrap();
    let tool = write_script(
        dir.path(),
        "modulecmd",
        "echo \"os.environ['LAST_$2'] = '$3'\"\n",
    );
    fs::write(
        dir.path().join("config.toml"),
        "echo_stderr = false\nstartup = [\"use /opt/modulefiles\"]\n",
    )
    .unwrap();

    let (status, out) = run(&dir, &tool, &["--shell", "powershell"], &["load", "gcc"]);
    assert_eq!(status, 0);
    assert_eq!(
        out,
        "$env:LAST_use = '/opt/modulefiles'\n$env:LAST_load = 'gcc'\n"
    );
}

#[test]
fn hostile_variable_name_is_not_printed() {
    let dir = TempDir::new().unwrap();
    let tool = write_script(
        dir.path(),
        "modulecmd",
        "echo \"os.environ['X;touch /tmp/envmod-pwned;Y'] = 'v'\"\n",
    );
    let config = dir.path().join("config.toml");
    fs::write(&config, "echo_stderr = false\n").unwrap();

    let cli = Cli::parse_from([
        "envmod".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--modulecmd".to_string(),
        tool.display().to_string(),
        "--shell".to_string(),
        "sh".to_string(),
        "load".to_string(),
        "gcc".to_string(),
    ]);
    let mut out = Vec::new();
    let err = cli::run(&cli, &mut out).unwrap_err();
    assert!(format!("{:#}", err).contains("Refusing to render variable name"));
    assert!(out.is_empty());
}

#[test]
fn missing_module_command_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let cli = Cli::parse_from([
        "envmod".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--modulecmd".to_string(),
        dir.path().join("missing").display().to_string(),
        "load".to_string(),
        "gcc".to_string(),
    ]);
    let mut out = Vec::new();
    let err = cli::run(&cli, &mut out).unwrap_err();
    assert!(format!("{:#}", err).contains("FileNotFoundError"));
}

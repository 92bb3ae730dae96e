//! Run a child process with vault secrets in its environment.

use std::process::Command;

use crate::errors::{EnvCryptError, Result};
use crate::vault::SecretSet;

/// Spawn `program` with `args`, stdio inherited, and wait for it.
///
/// The child sees the parent's environment plus every secret, secrets
/// taking precedence. With `clean_env` it sees only the secrets.
/// A non-zero exit surfaces as `ChildProcessFailed(code)`.
pub fn run(program: &str, args: &[String], secrets: &SecretSet, clean_env: bool) -> Result<()> {
    let mut cmd = build_command(program, args, secrets, clean_env);

    tracing::info!(program, injected = secrets.len(), clean_env, "spawning child process");
    let status = cmd
        .status()
        .map_err(|e| EnvCryptError::CommandFailed(format!("failed to start '{program}': {e}")))?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(EnvCryptError::ChildProcessFailed(code)),
        None => Err(EnvCryptError::CommandFailed(
            "child process terminated by signal".into(),
        )),
    }
}

/// Run a full argv (`command[0]` is the program).
pub fn run_argv(command: &[String], secrets: &SecretSet, clean_env: bool) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or(EnvCryptError::NoCommandSpecified)?;
    run(program, args, secrets, clean_env)
}

fn build_command(program: &str, args: &[String], secrets: &SecretSet, clean_env: bool) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if clean_env {
        cmd.env_clear();
    }
    cmd.envs(secrets.iter());
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn secrets() -> SecretSet {
        let mut set = SecretSet::new();
        set.insert("DB_URL", "postgres://localhost/db").unwrap();
        set
    }

    #[test]
    fn command_carries_secrets() {
        let cmd = build_command("env", &[], &secrets(), false);
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.contains(&(
            OsStr::new("DB_URL"),
            Some(OsStr::new("postgres://localhost/db"))
        )));
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert!(matches!(
            run_argv(&[], &secrets(), false),
            Err(EnvCryptError::NoCommandSpecified)
        ));
    }

    #[test]
    fn missing_program_is_command_failed() {
        let err = run("definitely-not-a-real-program-xyz", &[], &secrets(), false).unwrap_err();
        assert!(matches!(err, EnvCryptError::CommandFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_is_forwarded() {
        let args = vec!["-c".to_string(), "exit 7".to_string()];
        let err = run("/bin/sh", &args, &SecretSet::new(), false).unwrap_err();
        assert!(matches!(err, EnvCryptError::ChildProcessFailed(7)));
    }

    #[cfg(unix)]
    #[test]
    fn child_sees_secret_and_clean_env_drops_parent_vars() {
        let check = vec![
            "-c".to_string(),
            r#"test "$DB_URL" = "postgres://localhost/db" && test -z "$HOME""#.to_string(),
        ];
        assert!(run("/bin/sh", &check, &secrets(), true).is_ok());

        let inherits = vec!["-c".to_string(), r#"test -n "$PATH""#.to_string()];
        assert!(run("/bin/sh", &inherits, &secrets(), false).is_ok());
    }
}

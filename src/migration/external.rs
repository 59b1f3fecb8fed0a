// ABOUTME: Wrapper for the mysqldump client as an alternate data source
// ABOUTME: Captures its output to a temp file and forwards stderr to the progress log

use crate::connection::ConnectionDescriptor;
use crate::error::MigrationError;
use crate::migration::filter::filter_dump;
use crate::progress::ProgressLog;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Options fixed for every data dump taken with mysqldump
const MYSQLDUMP_ARGS: &[&str] = &[
    "--single-transaction",
    "--skip-lock-tables",
    "--compact",
    "--skip-add-drop-table",
    "--no-create-info",
    "--skip-tz-utc",
    "--extended-insert",
    "--verbose",
    "--set-gtid-purged=OFF",
];

/// How to run the external dumper
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MysqldumpOptions {
    /// Explicit binary; searched on PATH when `None`
    pub executable: Option<PathBuf>,
}

impl MysqldumpOptions {
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    fn resolve(&self) -> Result<PathBuf> {
        let configured = self
            .executable
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        crate::utils::locate_mysqldump(configured.as_deref())
    }
}

/// Command-line arguments for one run. The password is never part of them.
pub fn build_args(descriptor: &ConnectionDescriptor, tables: &[String]) -> Vec<String> {
    let mut args: Vec<String> = MYSQLDUMP_ARGS.iter().map(|s| s.to_string()).collect();
    args.push("--host".to_string());
    args.push(descriptor.host.clone());
    args.push("--port".to_string());
    args.push(descriptor.port.to_string());
    args.push("--user".to_string());
    args.push(descriptor.user.clone());

    if tables.is_empty() {
        args.push("--databases".to_string());
        args.push(descriptor.database.clone());
    } else {
        args.push(descriptor.database.clone());
        args.extend(tables.iter().cloned());
    }
    args
}

/// Run mysqldump and return its complete output text
///
/// Stdout goes to a temporary file that is removed on every exit path;
/// stderr lines (the `--verbose` progress) are forwarded to `log` as they
/// arrive.
///
/// # Errors
///
/// - the binary cannot be located or started
/// - the process exits with a non-zero status
/// - the output is not valid UTF-8 (`MigrationError::Encoding`)
pub async fn run_mysqldump(
    descriptor: &ConnectionDescriptor,
    tables: &[String],
    options: &MysqldumpOptions,
    log: &ProgressLog,
) -> Result<String> {
    descriptor.validate_with_database()?;
    let executable = options.resolve()?;
    log.emit(format!("mysqldump path: {}", executable.display()));

    let capture = tempfile::NamedTempFile::new().context("Failed to create mysqldump capture file")?;
    let stdout_file = capture
        .reopen()
        .context("Failed to open mysqldump capture file")?;

    let mut cmd = Command::new(&executable);
    cmd.args(build_args(descriptor, tables))
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if !descriptor.password.is_empty() {
        cmd.env("MYSQL_PWD", &descriptor.password);
    }

    let mut child = cmd.spawn().with_context(|| {
        format!(
            "Failed to execute {}. Is the MySQL client installed?",
            executable.display()
        )
    })?;

    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read mysqldump output")?
        {
            log.forward(&line);
        }
    }

    let status = child.wait().await.context("Failed to wait for mysqldump")?;
    if !status.success() {
        bail!(
            "mysqldump failed for database '{}' ({}).\n\
             \n\
             Common causes:\n\
             - Connection authentication failed\n\
             - User lacks SELECT or LOCK privileges\n\
             - Table does not exist\n\
             - Network connectivity issues",
            descriptor.database,
            status
        );
    }

    let bytes = tokio::fs::read(capture.path())
        .await
        .context("Failed to read mysqldump capture file")?;
    String::from_utf8(bytes).map_err(|e| {
        MigrationError::encoding(format!("mysqldump output is not valid UTF-8: {}", e)).into()
    })
}

/// Data-only statements from a mysqldump run, ready to append to a dump
///
/// The output is passed through the dump filter keeping only INSERT blocks
/// and ends with a newline so the last statement keeps its `;\n` terminator.
pub async fn dump_data_with_mysqldump(
    descriptor: &ConnectionDescriptor,
    tables: &[String],
    options: &MysqldumpOptions,
    log: &ProgressLog,
) -> Result<String> {
    let raw = run_mysqldump(descriptor, tables, options, log).await?;
    let mut data = filter_dump(&raw, false, true);
    if !data.is_empty() && !data.ends_with('\n') {
        data.push('\n');
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::new("db.local", 3307, "backup", "s3cret", "shop")
    }

    #[test]
    fn test_args_with_tables() {
        let args = build_args(&descriptor(), &["users".to_string(), "orders".to_string()]);
        assert!(args.contains(&"--no-create-info".to_string()));
        assert!(args.contains(&"--set-gtid-purged=OFF".to_string()));
        let tail: Vec<&str> = args.iter().rev().take(3).map(|s| s.as_str()).collect();
        assert_eq!(tail, vec!["orders", "users", "shop"]);
        let port_idx = args.iter().position(|a| a == "--port").unwrap();
        assert_eq!(args[port_idx + 1], "3307");
    }

    #[test]
    fn test_args_without_tables_dump_database() {
        let args = build_args(&descriptor(), &[]);
        let n = args.len();
        assert_eq!(&args[n - 2..], &["--databases".to_string(), "shop".to_string()]);
    }

    #[test]
    fn test_password_never_in_args() {
        let args = build_args(&descriptor(), &[]);
        assert!(args.iter().all(|a| !a.contains("s3cret")));
    }

    #[tokio::test]
    async fn test_missing_executable_is_reported() {
        let options = MysqldumpOptions::with_executable("/no/such/dir/mysqldump");
        let err = run_mysqldump(&descriptor(), &[], &options, &ProgressLog::silent("export-log"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fake_dumper_output_is_filtered_to_data() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("mysqldump");
        let mut f = std::fs::File::create(&script).unwrap();
        writeln!(f, "#!/bin/sh").unwrap();
        writeln!(f, "echo '-- Connecting to db.local...' >&2").unwrap();
        writeln!(f, "echo 'LOCK TABLES `users` WRITE;'").unwrap();
        writeln!(f, "echo \"INSERT INTO \\`users\\` VALUES (1,'a'),(2,'b');\"").unwrap();
        writeln!(f, "echo 'UNLOCK TABLES;'").unwrap();
        drop(f);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let sink = std::sync::Arc::new(crate::progress::MemorySink::new());
        let log = ProgressLog::new(Some(sink.clone()), "export-log");
        let data = dump_data_with_mysqldump(
            &descriptor(),
            &["users".to_string()],
            &MysqldumpOptions::with_executable(&script),
            &log,
        )
        .await
        .unwrap();

        assert_eq!(data, "INSERT INTO `users` VALUES (1,'a'),(2,'b');\n");
        assert!(sink
            .messages("export-log")
            .contains(&"-- Connecting to db.local...".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("mysqldump");
        std::fs::write(&script, "#!/bin/sh\necho 'Access denied' >&2\nexit 2\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = run_mysqldump(
            &descriptor(),
            &[],
            &MysqldumpOptions::with_executable(&script),
            &ProgressLog::silent("export-log"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("mysqldump failed"));
    }
}

//! External process runner with bounded output and timeout / 外部进程调用
//!
//! Used by the external walker and content searcher. The child is killed when
//! the timeout expires or stdout grows past the buffer limit.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Stderr is only kept for diagnostics / 仅用于诊断
const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// Limits applied to one invocation / 调用限制
#[derive(Debug, Clone, Copy)]
pub struct ProcessLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Default for ProcessLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_output_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Captured process output / 进程输出
#[derive(Debug)]
pub struct ProcessOutput {
    /// None when terminated by a signal / 被信号终止时为空
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Program missing or not executable / 程序不存在
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: std::io::Error },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("{program} output exceeded {limit} bytes")]
    OutputOverflow { program: String, limit: usize },

    #[error("{program} I/O error: {source}")]
    Io { program: String, source: std::io::Error },
}

/// Run `program` with `args` (no shell) and collect bounded output / 运行外部程序
pub async fn run(program: &str, args: &[String], limits: ProcessLimits) -> Result<ProcessOutput, ProcessError> {
    tracing::debug!("Spawning {} with {} args", program, args.len());

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn { program: program.to_string(), source })?;

    let io_err = |source| ProcessError::Io { program: program.to_string(), source };

    let stdout = child.stdout.take().ok_or_else(|| io_err(std::io::Error::other("stdout not captured")))?;
    let stderr = child.stderr.take().ok_or_else(|| io_err(std::io::Error::other("stderr not captured")))?;

    let collect = async {
        let (out, err) = tokio::join!(
            read_bounded(stdout, limits.max_output_bytes as u64 + 1),
            read_head_and_drain(stderr, MAX_STDERR_BYTES),
        );
        let out = out.map_err(io_err)?;
        let err = err.map_err(io_err)?;

        if out.len() > limits.max_output_bytes {
            return Err(ProcessError::OutputOverflow {
                program: program.to_string(),
                limit: limits.max_output_bytes,
            });
        }

        let status = child.wait().await.map_err(io_err)?;
        Ok(ProcessOutput {
            code: status.code(),
            stdout: out,
            stderr: String::from_utf8_lossy(&err).into_owned(),
        })
    };

    // Dropping the future drops the child, kill_on_drop terminates it
    match tokio::time::timeout(limits.timeout, collect).await {
        Ok(result) => result,
        Err(_) => Err(ProcessError::Timeout {
            program: program.to_string(),
            secs: limits.timeout.as_secs(),
        }),
    }
}

async fn read_bounded<R: AsyncRead + Unpin>(reader: R, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(limit).read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Keep the first `limit` bytes and discard the rest, the pipe stays open
/// until the child closes it / 保留开头，丢弃剩余内容
async fn read_head_and_drain<R: AsyncRead + Unpin>(mut reader: R, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    (&mut reader).take(limit).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_collects_output() {
        let output = run("sh", &["-c".to_string(), "printf hello".to_string()], ProcessLimits::default())
            .await
            .unwrap();
        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout, b"hello");
    }

    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let output = run("sh", &["-c".to_string(), "exit 1".to_string()], ProcessLimits::default())
            .await
            .unwrap();
        assert_eq!(output.code, Some(1));
    }

    #[tokio::test]
    async fn test_run_survives_noisy_stderr() {
        let script = "printf 'd\\t/n/a\\n'; \
            i=0; while [ $i -lt 3000 ]; do echo \"find: /n/x$i: Permission denied\" >&2; i=$((i+1)); done; \
            printf 'f\\t/n/a/late.md\\n'";
        let output = run("sh", &["-c".to_string(), script.to_string()], ProcessLimits::default())
            .await
            .unwrap();
        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout, b"d\t/n/a\nf\t/n/a/late.md\n");
        assert_eq!(output.stderr.len() as u64, MAX_STDERR_BYTES);
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let result = run("definitely-not-a-real-program-xyz", &[], ProcessLimits::default()).await;
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_run_output_overflow() {
        let limits = ProcessLimits { max_output_bytes: 4, ..Default::default() };
        let result = run("sh", &["-c".to_string(), "printf 0123456789".to_string()], limits).await;
        assert!(matches!(result, Err(ProcessError::OutputOverflow { limit: 4, .. })));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let limits = ProcessLimits { timeout: Duration::from_millis(100), ..Default::default() };
        let result = run("sleep", &["5".to_string()], limits).await;
        assert!(matches!(result, Err(ProcessError::Timeout { .. })));
    }
}

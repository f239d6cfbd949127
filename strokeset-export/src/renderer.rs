use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use strokeset_config::RendererConfig;
use tracing::{debug, warn};

use crate::errors::RenderError;

/// 把压缩后的子文档渲染为 PNG 字节。
pub trait Renderer {
    fn render(&self, document: &[u8]) -> Result<Vec<u8>, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, RenderError>,
{
    fn render(&self, document: &[u8]) -> Result<Vec<u8>, RenderError> {
        self(document)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 调用 `rnote-cli export selection` 的渲染器。
///
/// 每次渲染都在独立的临时目录中写出 `cell.rnote`，渲染结果读回后目录即被删除。
#[derive(Debug, Clone)]
pub struct RnoteCliRenderer {
    program: PathBuf,
    leading_args: Vec<OsString>,
    timeout: Duration,
}

impl RnoteCliRenderer {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.program.clone(), Duration::from_secs(config.timeout_secs))
            .with_leading_args(config.leading_args.iter().map(OsString::from))
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, document: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(["export", "selection", "--output-file"])
            .arg(output)
            .args(["--no-pattern", "--no-background", "all"])
            .arg(document)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }

    fn wait(&self, mut child: Child) -> Result<ExitStatus, RenderError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= self.timeout => {
                    warn!(timeout = ?self.timeout, "渲染进程超时，强制结束");
                    terminate(&mut child);
                    return Err(RenderError::Timeout {
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    terminate(&mut child);
                    return Err(RenderError::Wait { source });
                }
            }
        }
    }
}

/// 结束并回收子进程，避免留下僵尸进程。
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Renderer for RnoteCliRenderer {
    fn render(&self, document: &[u8]) -> Result<Vec<u8>, RenderError> {
        let scratch = tempfile::Builder::new()
            .prefix("strokeset-")
            .tempdir()
            .map_err(|source| RenderError::Scratch {
                path: std::env::temp_dir(),
                source,
            })?;
        let document_path = scratch.path().join("cell.rnote");
        let output_path = scratch.path().join("cell.png");
        fs::write(&document_path, document).map_err(|source| RenderError::Scratch {
            path: document_path.clone(),
            source,
        })?;

        debug!(program = %self.program.display(), document = %document_path.display(), "调用渲染程序");
        let child = self
            .command(&document_path, &output_path)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let status = self.wait(child)?;
        if !status.success() {
            return Err(RenderError::Exit { status });
        }

        fs::read(&output_path).map_err(|source| RenderError::Scratch {
            path: output_path,
            source,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// 用 `sh -c` 模拟 rnote-cli：`$0` 为程序名，`$4` 为输出路径，`$8` 为文档路径。
    fn shell(script: &str, timeout: Duration) -> RnoteCliRenderer {
        RnoteCliRenderer::new("sh", timeout).with_leading_args(["-c", script, "rnote-cli"])
    }

    #[test]
    fn passes_documented_arguments() {
        let renderer = shell(
            r#"[ "$1 $2 $3 $5 $6 $7" = "export selection --output-file --no-pattern --no-background all" ] || exit 9
cp "$8" "$4""#,
            Duration::from_secs(10),
        );
        let image = renderer.render(b"document-bytes").expect("渲染成功");
        assert_eq!(image, b"document-bytes".to_vec());
    }

    #[test]
    fn non_zero_exit_is_a_render_error() {
        let renderer = shell("exit 3", Duration::from_secs(10));
        let err = renderer.render(b"doc").expect_err("非零退出码应失败");
        match err {
            RenderError::Exit { status } => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_output_is_a_render_error() {
        let renderer = shell("exit 0", Duration::from_secs(10));
        let err = renderer.render(b"doc").expect_err("没有输出文件应失败");
        assert!(matches!(err, RenderError::Scratch { .. }), "unexpected error: {err}");
    }

    #[test]
    fn slow_renderer_times_out() {
        let renderer = shell("sleep 5", Duration::from_millis(200));
        let started = Instant::now();
        let err = renderer.render(b"doc").expect_err("应超时");
        assert!(matches!(err, RenderError::Timeout { .. }), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn terminate_reaps_child_process() {
        let mut child = Command::new("sleep").arg("5").spawn().expect("启动子进程");
        let pid = child.id();
        terminate(&mut child);

        let status = child.try_wait().expect("查询状态").expect("子进程已回收");
        assert!(!status.success());
        #[cfg(target_os = "linux")]
        assert!(!Path::new(&format!("/proc/{pid}")).exists(), "僵尸进程仍存在");
        let _ = pid;
    }

    #[test]
    fn unknown_program_fails_to_spawn() {
        let renderer = RnoteCliRenderer::new(
            "/nonexistent/strokeset/rnote-cli",
            Duration::from_secs(1),
        );
        let err = renderer.render(b"doc").expect_err("程序不存在应失败");
        assert!(matches!(err, RenderError::Spawn { .. }), "unexpected error: {err}");
    }
}

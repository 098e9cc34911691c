//! 알림 싱크 — 내구 기록 + 콘솔 출력
//!
//! 알림은 append 전용 파일에 한 줄 레코드로 기록되고, 인터랙티브 콘솔이
//! 연결되어 있으면 종류별 색상으로 강조 출력됩니다.
//!
//! 내구 기록이 실패해도 콘솔 출력은 반드시 수행됩니다 (best-effort
//! durability). 기록 실패는 경고로 남기고 다음 알림에서 파일을 다시
//! 엽니다. 어떤 실패도 탐지 경로로 전파되지 않습니다.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use logwarden_core::metrics as m;
use logwarden_core::types::{Alert, AlertKind};

/// 알림 싱크
pub struct AlertSink {
    /// 알림 파일 경로
    path: PathBuf,
    /// 열린 append 핸들 (기록 실패 시 버리고 재오픈)
    file: Option<File>,
    /// 콘솔 출력 여부 (stdout이 터미널일 때만 기본 활성)
    console: bool,
    /// 내구 기록 실패 횟수
    write_failures: u64,
}

impl AlertSink {
    /// 알림 파일을 열어 싱크를 생성합니다.
    ///
    /// 파일 오픈 실패는 치명적이지 않습니다. 콘솔 전용으로 동작을
    /// 시작하고 기록 시점마다 재오픈을 시도합니다.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match open_append(&path).await {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to open alerts file, starting console-only"
                );
                None
            }
        };

        Self {
            path,
            file,
            console: std::io::stdout().is_terminal(),
            write_failures: 0,
        }
    }

    /// 콘솔 출력을 강제로 켜거나 끕니다 (테스트/임베딩용).
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// 알림을 기록합니다.
    ///
    /// 탐지 경로에서 동기적으로 호출해도 안전하며, 실패를 반환하지
    /// 않습니다.
    pub async fn record(&mut self, alert: &Alert) {
        let line = alert.to_record_line();

        if let Err(e) = self.write_durable(&line).await {
            self.write_failures += 1;
            // 핸들을 버려 다음 기록에서 재오픈
            self.file = None;
            metrics::counter!(m::MONITOR_ALERT_WRITE_FAILURES_TOTAL).increment(1);
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to persist alert, continuing console-only"
            );
        }

        if self.console {
            print_colored(alert.kind, &line);
        }

        tracing::info!(
            kind = alert.kind.as_str(),
            source_address = %alert.source_address,
            description = %alert.description,
            "security alert raised"
        );
    }

    /// 내구 기록 실패 횟수를 반환합니다.
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// 알림 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_durable(&mut self, line: &str) -> std::io::Result<()> {
        if self.file.is_none() {
            self.file = Some(open_append(&self.path).await?);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await?;
        }
        Ok(())
    }
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}

/// 알림 종류별 색상으로 콘솔에 출력합니다.
fn print_colored(kind: AlertKind, line: &str) {
    let tagged = format!("[!] {line}");
    let rendered = match kind {
        AlertKind::BruteForce => tagged.red(),
        AlertKind::SqlInjection => tagged.yellow(),
        AlertKind::UnauthorizedAccess => tagged.magenta(),
        AlertKind::EndpointScanning => tagged.cyan(),
    };
    println!("{rendered}");
}

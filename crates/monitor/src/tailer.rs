//! 로그 테일러 — `tail -f` 방식의 비동기 라인 수집
//!
//! 테일링 시작 시점의 파일 끝에서 출발하여 새로 추가되는 라인만
//! 방출합니다 (과거 내용은 재생하지 않음). 완결된 라인만 내보내며,
//! 개행이 아직 도착하지 않은 꼬리 데이터는 버퍼에 보관합니다.
//!
//! # 복구 동작
//! - 파일 절단/로테이션 (디스크 길이 < 읽기 오프셋): 처음부터 재오픈
//! - 소스 유실: 한 번만 경고하고 재시도 주기로 복귀를 기다림
//! - 대기는 모두 취소 토큰과 경쟁하므로 종료 지연이 없습니다
//!
//! 초기 오픈 실패만이 치명적입니다 (데몬이 비정상 종료 코드로 보고).

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logwarden_core::metrics as m;

use crate::error::MonitorError;

/// 한 번의 read 호출이 사용하는 버퍼 크기
const READ_CHUNK: usize = 8 * 1024;

/// 테일러 설정
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// 감시할 파일 경로
    pub path: PathBuf,
    /// 신규 데이터 폴링 주기
    pub poll_interval: Duration,
    /// 소스 유실 시 재시도 주기
    pub retry_interval: Duration,
    /// 최대 라인 길이 (바이트), 초과 라인은 스킵
    pub max_line_length: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("application.log"),
            poll_interval: Duration::from_millis(100),
            retry_interval: Duration::from_millis(5000),
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 파일 테일러
///
/// [`LogTailer::open`]으로 생성한 뒤 `tokio::spawn`으로 별도 태스크에서
/// [`LogTailer::run`]을 실행합니다. 수집된 라인은 mpsc 채널로 전달됩니다.
pub struct LogTailer {
    /// 테일러 설정
    config: TailerConfig,
    /// 열린 파일 핸들
    file: File,
    /// 현재 읽기 오프셋 (바이트)
    offset: u64,
    /// 아직 개행이 도착하지 않은 꼬리 데이터
    pending: Vec<u8>,
    /// 수집된 라인 전송 채널
    tx: mpsc::Sender<Bytes>,
    /// 종료 신호
    cancel: CancellationToken,
    /// 소스 유실을 이미 보고했는지 여부
    missing_reported: bool,
}

impl LogTailer {
    /// 소스를 열고 파일 끝으로 이동한 테일러를 생성합니다.
    ///
    /// # Errors
    ///
    /// 소스가 존재하지 않으면 [`MonitorError::SourceAbsent`],
    /// 그 외 오픈 실패는 [`MonitorError::Tail`]을 반환합니다.
    pub async fn open(
        config: TailerConfig,
        tx: mpsc::Sender<Bytes>,
        cancel: CancellationToken,
    ) -> Result<Self, MonitorError> {
        let path_display = config.path.display().to_string();

        let mut file = File::open(&config.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MonitorError::SourceAbsent { path: path_display.clone() }
            } else {
                MonitorError::Tail {
                    path: path_display.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| MonitorError::Tail {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(Self {
            config,
            file,
            offset,
            pending: Vec::new(),
            tx,
            cancel,
            missing_reported: false,
        })
    }

    /// 테일링 루프를 실행합니다.
    ///
    /// 취소 토큰이 발화하거나 수신측이 닫힐 때까지 실행됩니다.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        let path = self.config.path.display().to_string();
        tracing::info!(path = %path, offset = self.offset, "tailing log source from current end");

        let mut chunk = vec![0u8; READ_CHUNK];

        while !self.cancel.is_cancelled() {
            let read = match self.file.read(&mut chunk).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "read failed, backing off");
                    if self.wait(self.config.retry_interval).await {
                        break;
                    }
                    self.reopen_from_start().await;
                    continue;
                }
            };

            if read > 0 {
                self.offset += read as u64;
                if self.emit_lines(&chunk[..read]).await {
                    // 수신측 종료 — 더 읽을 이유가 없음
                    break;
                }
                continue;
            }

            // EOF — 소스가 절단/교체/유실되었는지 확인한 뒤 대기
            match tokio::fs::metadata(&self.config.path).await {
                Ok(meta) if meta.len() < self.offset => {
                    tracing::warn!(
                        path = %path,
                        disk_len = meta.len(),
                        offset = self.offset,
                        "log source truncated or rotated, reopening from start"
                    );
                    if !self.reopen_from_start().await
                        && self.wait(self.config.retry_interval).await
                    {
                        break;
                    }
                }
                Ok(_) => {
                    self.missing_reported = false;
                    if self.wait(self.config.poll_interval).await {
                        break;
                    }
                }
                Err(e) => {
                    if !self.missing_reported {
                        self.missing_reported = true;
                        tracing::warn!(
                            path = %path,
                            error = %e,
                            "log source unavailable, waiting for it to return"
                        );
                    }
                    if self.wait(self.config.retry_interval).await {
                        break;
                    }
                    self.reopen_from_start().await;
                }
            }
        }

        tracing::debug!(path = %path, "log tailer stopped");
        Ok(())
    }

    /// 취소 가능한 대기. 취소로 깨어났으면 `true`를 반환합니다.
    async fn wait(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }

    /// 소스를 처음부터 다시 엽니다. 성공 여부를 반환합니다.
    ///
    /// 재오픈 후의 내용은 전부 새 데이터이므로 오프셋 0에서 읽습니다.
    async fn reopen_from_start(&mut self) -> bool {
        match File::open(&self.config.path).await {
            Ok(file) => {
                self.file = file;
                self.offset = 0;
                self.pending.clear();
                self.missing_reported = false;
                true
            }
            Err(e) => {
                tracing::debug!(
                    path = %self.config.path.display(),
                    error = %e,
                    "reopen attempt failed"
                );
                false
            }
        }
    }

    /// 읽은 데이터에서 완결된 라인을 추출하여 송신합니다.
    ///
    /// 수신측이 닫혔으면 `true`를 반환합니다.
    async fn emit_lines(&mut self, data: &[u8]) -> bool {
        self.pending.extend_from_slice(data);

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop(); // '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.is_empty() {
                continue;
            }
            if line.len() > self.config.max_line_length {
                tracing::warn!(
                    len = line.len(),
                    max = self.config.max_line_length,
                    "skipping over-long line"
                );
                continue;
            }

            metrics::counter!(m::MONITOR_LINES_TOTAL).increment(1);
            if self.tx.send(Bytes::from(line)).await.is_err() {
                return true;
            }
        }

        false
    }
}

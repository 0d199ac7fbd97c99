//! 进度报告
//!
//! 后台线程按固定间隔读取计数器并输出 PROGRESS 日志，只读不写，不与主循环争锁。

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::fabric::{Metrics, MetricsSnapshot};

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// 两次采样之间的增量速率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub nodes: u64,
    pub nodes_per_sec: f64,
    pub resolves: u64,
    pub resolves_per_sec: f64,
}

impl Progress {
    pub fn between(prev: &MetricsSnapshot, now: &MetricsSnapshot, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let rate = |delta: u64| if secs > 0.0 { delta as f64 / secs } else { 0.0 };
        let nodes = now.nodes_total().saturating_sub(prev.nodes_total());
        let resolves = now.resolves().saturating_sub(prev.resolves());
        Self {
            nodes,
            nodes_per_sec: rate(nodes),
            resolves,
            resolves_per_sec: rate(resolves),
        }
    }
}

#[derive(Debug)]
pub struct ProgressReporter {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    pub fn spawn(metrics: Arc<Metrics>, interval: Duration) -> std::io::Result<Self> {
        let (stop, rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("progress".into())
            .spawn(move || {
                let mut prev = metrics.snapshot();
                let mut last = Instant::now();
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let now = metrics.snapshot();
                    let progress = Progress::between(&prev, &now, last.elapsed());
                    info!(
                        nodes = progress.nodes,
                        nodes_per_sec = progress.nodes_per_sec,
                        resolves = now.resolves(),
                        resolves_per_sec = progress.resolves_per_sec,
                        "PROGRESS"
                    );
                    prev = now;
                    last = Instant::now();
                }
                debug!("进度线程退出");
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// 通知线程退出并等待其结束
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Background CPU, memory and GPU sampling.
//!
//! The sampler runs as a tokio task and publishes an immutable
//! [`ResourceSnapshot`] on a watch channel; readers clone the latest value.

use std::time::Duration;

use serde::Serialize;
use sysinfo::System;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(2);

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuStats {
    pub index: u32,
    pub name: String,
    pub load_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub temperature_c: Option<f32>,
}

impl GpuStats {
    pub fn memory_percent(&self) -> f32 {
        if self.memory_total_mb == 0 {
            0.0
        } else {
            self.memory_used_mb as f32 / self.memory_total_mb as f32 * 100.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub cpu_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    /// Empty when no GPU could be queried
    pub gpus: Vec<GpuStats>,
}

impl ResourceSnapshot {
    pub fn memory_used_gb(&self) -> f64 {
        self.memory_used_bytes as f64 / BYTES_PER_GB
    }

    pub fn memory_total_gb(&self) -> f64 {
        self.memory_total_bytes as f64 / BYTES_PER_GB
    }

    pub fn memory_percent(&self) -> f64 {
        if self.memory_total_bytes == 0 {
            0.0
        } else {
            self.memory_used_bytes as f64 / self.memory_total_bytes as f64 * 100.0
        }
    }

    /// One-line summary for progress bar messages.
    pub fn compact(&self) -> String {
        let mut line = format!(
            "CPU {:.1}% | MEM {:.1}/{:.1} GB",
            self.cpu_percent,
            self.memory_used_gb(),
            self.memory_total_gb()
        );
        if let Some(gpu) = self.gpus.first() {
            line.push_str(&format!(" | GPU {:.0}%", gpu.load_percent));
        }
        line
    }
}

/// Owned sampler task. Dropping or stopping it aborts the task.
pub struct ResourceMonitor {
    rx: watch::Receiver<ResourceSnapshot>,
    handle: JoinHandle<()>,
}

impl ResourceMonitor {
    pub fn start(interval: Duration) -> Self {
        let (tx, rx) = watch::channel(ResourceSnapshot::default());

        let handle = tokio::spawn(async move {
            let mut system = System::new();
            // CPU usage is computed between two refreshes.
            system.refresh_cpu_usage();

            loop {
                tokio::time::sleep(interval).await;

                system.refresh_cpu_usage();
                system.refresh_memory();

                let snapshot = ResourceSnapshot {
                    cpu_percent: system.global_cpu_usage(),
                    memory_used_bytes: system.used_memory(),
                    memory_total_bytes: system.total_memory(),
                    gpus: query_gpus().await,
                };

                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        Self { rx, handle }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ResourceSnapshot {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceSnapshot> {
        self.rx.clone()
    }

    /// Stop sampling and return the last snapshot.
    pub fn stop(self) -> ResourceSnapshot {
        self.handle.abort();
        self.snapshot()
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn query_gpus() -> Vec<GpuStats> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=index,name,utilization.gpu,memory.used,memory.total,temperature.gpu",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout))
        }
        _ => Vec::new(),
    }
}

/// Parse `nvidia-smi --format=csv,noheader,nounits` rows; malformed rows are
/// skipped.
pub fn parse_nvidia_smi(output: &str) -> Vec<GpuStats> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 5 {
                return None;
            }
            Some(GpuStats {
                index: fields[0].parse().ok()?,
                name: fields[1].to_string(),
                load_percent: fields[2].parse().unwrap_or(0.0),
                memory_used_mb: fields[3].parse().unwrap_or(0),
                memory_total_mb: fields[4].parse().unwrap_or(0),
                temperature_c: fields.get(5).and_then(|t| t.parse().ok()),
            })
        })
        .collect()
}

//! Task transport seam
//!
//! The broker that moves task descriptors between the producer and the
//! worker is external; these traits are the boundary. The in-process
//! channel implementation backs single-process runs and tests.

use crate::types::AlignmentTask;
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

/// Producer side of the task transport
#[async_trait::async_trait]
pub trait TaskPublisher: Send + Sync {
    async fn publish(&self, task: AlignmentTask) -> Result<()>;
}

/// Consumer side of the task transport
#[async_trait::async_trait]
pub trait TaskConsumer: Send {
    /// Next task, or `None` once the transport is drained and closed
    async fn next_task(&mut self) -> Option<AlignmentTask>;
}

/// Create an in-process transport pair
pub fn channel() -> (ChannelPublisher, ChannelConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelPublisher { tx }, ChannelConsumer { rx })
}

/// Publisher over an in-process channel
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<AlignmentTask>,
}

#[async_trait::async_trait]
impl TaskPublisher for ChannelPublisher {
    async fn publish(&self, task: AlignmentTask) -> Result<()> {
        debug!(
            task_id = %task.task_id,
            cluster_id = task.cluster_id,
            "Publishing alignment task"
        );
        self.tx
            .send(task)
            .map_err(|_| anyhow::anyhow!("task channel closed"))
    }
}

/// Consumer over an in-process channel
pub struct ChannelConsumer {
    rx: mpsc::UnboundedReceiver<AlignmentTask>,
}

#[async_trait::async_trait]
impl TaskConsumer for ChannelConsumer {
    async fn next_task(&mut self) -> Option<AlignmentTask> {
        self.rx.recv().await
    }
}

// Bounded waiting - task polling and post-import settling
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;

use crate::application::console::{ManagementConsole, TaskRef, TaskState};
use crate::domain::check::CheckError;

pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Poll a backend task until it finishes, fails or the wall-clock ttl
/// elapses. Timeouts and backend failures are hard failures; there is no
/// retry and no cancellation.
pub async fn wait_for_task(
    console: &dyn ManagementConsole,
    task: &TaskRef,
    ttl: Duration,
) -> Result<()> {
    let deadline = Instant::now() + ttl;
    loop {
        match console.task_status(task).await? {
            TaskState::Finished => {
                tracing::info!(task = %task.id, "task finished");
                return Ok(());
            }
            TaskState::Failed => {
                return Err(CheckError::TaskFailed {
                    task: task.id.clone(),
                }
                .into());
            }
            TaskState::New | TaskState::InProgress => {}
        }
        if Instant::now() >= deadline {
            return Err(CheckError::TaskTimeout {
                task: task.id.clone(),
                ttl_secs: ttl.as_secs(),
            }
            .into());
        }
        tokio::time::sleep(TASK_POLL_INTERVAL).await;
    }
}

/// How long to hold off between a finished import task and reading the
/// cluster list.
#[async_trait]
pub trait SettleStrategy: Send + Sync {
    async fn settle(&self);
}

/// The backend's cluster list lags a finished import task; wait out the
/// window before reading it. Swap in [`NoSettle`] once the list is fresh
/// immediately after task completion.
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl SettleStrategy for FixedDelay {
    async fn settle(&self) {
        tracing::info!(secs = self.delay.as_secs(), "settling before reading the cluster list");
        tokio::time::sleep(self.delay).await;
    }
}

pub struct NoSettle;

#[async_trait]
impl SettleStrategy for NoSettle {
    async fn settle(&self) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;

    use super::*;
    use crate::application::console::{ConsoleView, ImportRequest};
    use crate::domain::cluster::{ClusterCandidate, ClusterSummary, HostEntry};

    /// Console stub that walks a scripted sequence of task states.
    struct ScriptedTask {
        states: Mutex<Vec<TaskState>>,
    }

    impl ScriptedTask {
        fn new(states: Vec<TaskState>) -> Self {
            Self {
                states: Mutex::new(states),
            }
        }
    }

    #[async_trait]
    impl ManagementConsole for ScriptedTask {
        async fn login(&self) -> Result<()> {
            Ok(())
        }

        async fn logout(&self) -> Result<()> {
            Ok(())
        }

        async fn current_view(&self) -> Result<ConsoleView> {
            unimplemented!("not used by wait tests")
        }

        async fn importable_clusters(&self) -> Result<Vec<ClusterCandidate>> {
            unimplemented!("not used by wait tests")
        }

        async fn activate_candidate(&self, _id: &str) -> Result<String> {
            unimplemented!("not used by wait tests")
        }

        async fn submit_import(&self, _id: &str) -> Result<ImportRequest> {
            unimplemented!("not used by wait tests")
        }

        async fn task_status(&self, _task: &TaskRef) -> Result<TaskState> {
            let mut states = self.states.lock().unwrap();
            Ok(if states.len() > 1 {
                states.remove(0)
            } else {
                states[0]
            })
        }

        async fn clusters(&self) -> Result<Vec<ClusterSummary>> {
            unimplemented!("not used by wait tests")
        }

        async fn cluster_hosts(&self, _name: &str) -> Result<Vec<HostEntry>> {
            unimplemented!("not used by wait tests")
        }
    }

    fn task() -> TaskRef {
        TaskRef {
            id: "job-1".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_through_in_progress_states() {
        let console = ScriptedTask::new(vec![
            TaskState::New,
            TaskState::InProgress,
            TaskState::InProgress,
            TaskState::Finished,
        ]);
        wait_for_task(&console, &task(), Duration::from_secs(3600))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_hard_failure() {
        let console = ScriptedTask::new(vec![TaskState::InProgress]);
        let err = wait_for_task(&console, &task(), Duration::from_secs(30))
            .await
            .unwrap_err();
        let err = err.downcast::<CheckError>().unwrap();
        assert!(matches!(err, CheckError::TaskTimeout { ttl_secs: 30, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_is_a_hard_failure() {
        let console = ScriptedTask::new(vec![TaskState::InProgress, TaskState::Failed]);
        let err = wait_for_task(&console, &task(), Duration::from_secs(3600))
            .await
            .unwrap_err();
        let err = err.downcast::<CheckError>().unwrap();
        assert!(matches!(err, CheckError::TaskFailed { .. }));
    }
}

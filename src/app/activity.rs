use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::{entity::activity::ActivityLog, repository::ActivityLogRepository};

/// Writes audit entries in the background.
#[derive(Clone)]
pub struct ActivityRecorder {
    repository: Arc<dyn ActivityLogRepository>,
}

impl ActivityRecorder {
    pub fn new(repository: Arc<dyn ActivityLogRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &dyn ActivityLogRepository {
        self.repository.as_ref()
    }

    /// Store `entry` without waiting for it.
    ///
    /// Failures are logged and never reach the caller. The returned handle
    /// may be awaited to observe completion.
    pub fn record(&self, entry: ActivityLog) -> JoinHandle<()> {
        let repository = self.repository.clone();
        tokio::spawn(async move {
            let user_id = entry.user_id.clone();
            let activity_type = entry.activity_type;
            let resource_id = entry.resource_id.clone();

            match repository.insert_activity(&entry).await {
                Ok(()) => tracing::debug!(
                    user_id = ?user_id,
                    activity_type = %activity_type,
                    resource_id = ?resource_id,
                    "activity logged"
                ),
                Err(err) => tracing::error!(
                    user_id = ?user_id,
                    activity_type = %activity_type,
                    "failed to log activity: {err}"
                ),
            }
        })
    }
}

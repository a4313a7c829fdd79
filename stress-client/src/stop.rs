//! Stop commands

use crate::FacadeClient;
use crate::error::{ClientError, Result};
use stress_core::domain::RunId;
use stress_core::dto::command::{NoBody, StatusReply, StopBody};

impl FacadeClient {
    /// Ask the server to cancel one run
    ///
    /// # Arguments
    /// * `run_id` - The run id returned by `play`
    pub async fn stop(&self, run_id: RunId) -> Result<()> {
        let reply = self.send_command("stop", StopBody { run_id }).await?;

        check_status(reply)
    }

    /// Cancel every strategy of the account, used to start from a clean server
    pub async fn stop_all(&self) -> Result<()> {
        let reply = self.send_command("stop-all", NoBody {}).await?;

        check_status(reply)
    }
}

fn check_status(reply: serde_json::Value) -> Result<()> {
    let status: StatusReply = serde_json::from_value(reply.clone()).unwrap_or_default();
    if status.is_ok() {
        Ok(())
    } else {
        Err(ClientError::rejected(status.status, reply.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_status() {
        assert!(check_status(json!({"status": 0})).is_ok());
        assert!(matches!(
            check_status(json!({"status": 1})),
            Err(ClientError::Rejected { .. })
        ));
        assert!(matches!(
            check_status(json!("garbage")),
            Err(ClientError::Rejected { .. })
        ));
    }
}

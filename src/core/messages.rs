use crate::domain::model::{BackendLog, MessageLevel, UserMessage};

/// Summary of an execution for the acting user, `None` when nothing ran.
pub fn summarize_logs(logs: &[BackendLog]) -> Option<UserMessage> {
    let total = logs.len();
    if total == 0 {
        return None;
    }
    let successes = logs.iter().filter(|log| log.is_success()).count();
    let errors = total - successes;

    if errors > 0 {
        let verb = if errors == 1 { "has" } else { "have" };
        Some(UserMessage {
            level: MessageLevel::Error,
            text: format!("{} out of {} backends {} failed to execute.", errors, total, verb),
        })
    } else {
        let text = if total == 1 {
            "1 backend has been executed.".to_string()
        } else {
            format!("{} backends have been executed.", total)
        };
        Some(UserMessage {
            level: MessageLevel::Success,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::LogState;
    use chrono::Utc;

    fn log(state: LogState) -> BackendLog {
        BackendLog {
            backend: "mail".to_string(),
            server: "web".to_string(),
            state,
            script: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            operations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_logs() {
        assert_eq!(summarize_logs(&[]), None);

        let msg = summarize_logs(&[log(LogState::Success)]).unwrap();
        assert_eq!(msg.level, MessageLevel::Success);
        assert_eq!(msg.text, "1 backend has been executed.");

        let msg = summarize_logs(&[log(LogState::Success), log(LogState::Failure), log(LogState::Error)]).unwrap();
        assert_eq!(msg.level, MessageLevel::Error);
        assert_eq!(msg.text, "2 out of 3 backends have failed to execute.");
    }
}

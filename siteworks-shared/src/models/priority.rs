/// Priority scales shared across models
///
/// Tasks and issues use the work scale (topping out at `Critical`);
/// material requests and notifications use the request scale (topping
/// out at `Urgent`). The two are distinct database enum types and are
/// never interchangeable.

use serde::{Deserialize, Serialize};

/// Priority for tasks and issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for WorkPriority {
    fn default() -> Self {
        WorkPriority::Medium
    }
}

/// Priority for material requests and notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for RequestPriority {
    fn default() -> Self {
        RequestPriority::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_defaults() {
        assert_eq!(WorkPriority::default(), WorkPriority::Medium);
        assert_eq!(RequestPriority::default(), RequestPriority::Medium);
    }

    #[test]
    fn test_priority_json_values() {
        assert_eq!(
            serde_json::to_string(&WorkPriority::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::to_string(&RequestPriority::Urgent).unwrap(),
            "\"URGENT\""
        );
    }
}

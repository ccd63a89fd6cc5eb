use serde::{Deserialize, Serialize};

use super::repo::Task;

/// Both fields are optional at the parse level so that a missing field
/// surfaces as a 400 validation failure instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Payload under `data` for the list endpoint.
#[derive(Debug, Serialize)]
pub struct TaskListData {
    pub count: usize,
    #[serde(rename = "myTasks")]
    pub my_tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn list_payload_uses_count_and_my_tasks() {
        let data = TaskListData {
            count: 1,
            my_tasks: vec![Task {
                id: Uuid::new_v4(),
                title: "t1".into(),
                description: "d1".into(),
                creator_email: "a@x.com".into(),
                created_at: OffsetDateTime::now_utc(),
            }],
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains(r#""count":1"#));
        assert!(json.contains(r#""myTasks""#));
        assert!(json.contains(r#""creator_email":"a@x.com""#));
    }

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"t1"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("t1"));
        assert!(req.description.is_none());

        let req: CreateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
    }
}

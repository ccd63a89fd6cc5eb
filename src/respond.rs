use axum::Json;
use serde::Serialize;

/// Success envelope shared by every endpoint: `{status, message, data?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "Success",
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn success_message(message: &str) -> Json<Envelope<()>> {
    Json(Envelope {
        status: "Success",
        message: message.to_string(),
        data: None,
    })
}

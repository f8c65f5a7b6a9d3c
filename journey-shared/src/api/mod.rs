use serde::{Deserialize, Serialize};

use crate::auth::Role;

pub mod catalog;
pub mod endpoints;
pub mod journey;
#[cfg(feature = "rest-client")]
pub mod rest;

pub use catalog::*;
pub use journey::*;

/// Envelope shared by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            count: Some(items.len()),
            data: Some(items),
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: message.into(),
            count: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            count: None,
        }
    }
}

// Auth forms (urlencoded)
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: Option<String>,
    pub age: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

// Profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub total_points: i32,
    pub role: Role,
    pub profile_image: Option<String>,
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateReq {
    pub name: Option<String>,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarResp {
    pub profile_image: String,
}

// Points ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointAwardDto {
    pub award_id: i32,
    pub source: crate::domain::PointSource,
    pub source_id: i32,
    pub points: i32,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsHistoryDto {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_points: i32,
    pub items: Vec<PointAwardDto>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_omits_absent_fields() {
        let v = serde_json::to_value(ApiResponse::error("Mission not found")).unwrap();
        assert_eq!(v, json!({"success": false, "message": "Mission not found"}));

        let v = serde_json::to_value(ApiResponse::list(vec![1, 2], "ok")).unwrap();
        assert_eq!(v, json!({"success": true, "data": [1, 2], "message": "ok", "count": 2}));
    }

    #[test]
    fn explicit_null_data_is_kept() {
        let v = serde_json::to_value(ApiResponse::ok(None::<i32>, "none yet")).unwrap();
        assert_eq!(v["data"], serde_json::Value::Null);
        assert!(v.as_object().unwrap().contains_key("data"));
    }

    /// Decoding must work for any payload type, not only `Default` ones.
    fn decode<T: serde::de::DeserializeOwned>(v: serde_json::Value) -> ApiResponse<T> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn missing_data_decodes_as_none() {
        let env: ApiResponse<UserDto> = decode(json!({"success": false, "message": "nope"}));
        assert!(!env.success);
        assert!(env.data.is_none());
        let env: ApiResponse<HealthDto> = decode(json!({
            "success": true,
            "data": {"status": "ok", "version": "1"},
            "message": "up"
        }));
        assert_eq!(env.data.map(|h| h.status).as_deref(), Some("ok"));
    }

    #[test]
    fn register_form_uses_camel_case_confirmation() {
        let f: RegisterForm = serde_json::from_value(json!({
            "name": "Ada",
            "passwordConfirm": "x"
        }))
        .unwrap();
        assert_eq!(f.password_confirm.as_deref(), Some("x"));
        assert!(f.email.is_none());
    }
}

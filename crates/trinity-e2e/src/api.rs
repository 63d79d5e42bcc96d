// Backend API client
//
// JSON over HTTP. Login yields a bearer token and user id; records are
// created through the generic `gen/insert` endpoint.

use crate::error::{Error, Result};
use crate::session::{Authenticator, Session};
use crate::transform::WorkItem;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Body of a `gen/insert` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    pub model: String,
    pub data: Value,
    pub user_id: String,
}

/// A timecard as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimecardRecord {
    pub status_ct: String,
    pub work_type_ct: String,
    pub project_id: Option<String>,
    pub type_task_ct: String,
    pub description: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub hours: String,
    pub user_id: String,
}

/// Hours added to fixture timestamps so entries land on the intended day in
/// the backend's timezone.
pub const TIMECARD_SHIFT_HOURS: i64 = 4;

/// Status code for a newly submitted timecard.
const TIMECARD_STATUS_SUBMITTED: &str = "1";

impl TimecardRecord {
    /// Builds a record from a timecard fixture row.
    ///
    /// An empty `projectId` becomes `null`; `start` and `end` are shifted by
    /// [`TIMECARD_SHIFT_HOURS`].
    pub fn from_item(item: &WorkItem, user_id: &str) -> Result<Self> {
        Ok(Self {
            status_ct: TIMECARD_STATUS_SUBMITTED.to_string(),
            work_type_ct: item.require("workTypeCt")?.to_string(),
            project_id: item.non_empty("projectId").map(String::from),
            type_task_ct: item.require("typeTaskCt")?.to_string(),
            description: item.get("description").unwrap_or_default().to_string(),
            date: item.require("date")?.to_string(),
            start: crate::dates::shift_iso(item.require("start")?, TIMECARD_SHIFT_HOURS)?,
            end: crate::dates::shift_iso(item.require("end")?, TIMECARD_SHIFT_HOURS)?,
            hours: item.require("hours")?.to_string(),
            user_id: user_id.to_string(),
        })
    }

    pub fn into_insert(self) -> Result<InsertRequest> {
        let user_id = self.user_id.clone();
        Ok(InsertRequest {
            model: "tri_timecard".to_string(),
            data: serde_json::to_value(self)?,
            user_id,
        })
    }
}

/// HTTP client for the backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    origin: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url` that presents itself as `origin`.
    pub fn new(base_url: impl Into<String>, origin: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(base_url, origin, client))
    }

    /// Creates a client with a custom reqwest client.
    pub fn with_client(
        base_url: impl Into<String>,
        origin: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            origin: origin.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        Ok(url::Url::parse(&format!("{}/{}", self.base_url, path))?)
    }

    fn post(&self, url: url::Url) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header(reqwest::header::REFERER, &self.origin)
            .header(reqwest::header::ORIGIN, &self.origin)
    }

    /// `POST /user/login`.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let url = self.endpoint("user/login")?;
        let response = self
            .post(url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::AuthenticationFailed {
                username: username.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        parse_login(username, &body)
    }

    /// `POST /gen/insert` with bearer auth. Accepts 200 and 201.
    pub async fn insert(&self, token: &str, request: &InsertRequest) -> Result<()> {
        let url = self.endpoint("gen/insert")?;
        let response = self.post(url).bearer_auth(token).json(request).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RecordRejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(model = %request.model, "record inserted");
        Ok(())
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        self.login(username, password).await
    }
}

/// Extracts the token and user id from a login response body.
///
/// The user id is read from `userId`, then `id`, then `user.id`.
pub fn parse_login(username: &str, body: &Value) -> Result<Session> {
    let malformed = |field: &str| Error::MalformedAuthResponse {
        username: username.to_string(),
        field: field.to_string(),
        body: body.to_string(),
    };

    let token = body
        .get("token")
        .and_then(id_string)
        .ok_or_else(|| malformed("token"))?;
    let user_id = body
        .get("userId")
        .and_then(id_string)
        .or_else(|| body.get("id").and_then(id_string))
        .or_else(|| body.pointer("/user/id").and_then(id_string))
        .ok_or_else(|| malformed("userId"))?;

    Ok(Session {
        username: username.to_string(),
        token,
        user_id,
    })
}

/// Non-empty strings and numbers; anything else is treated as absent.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_login_user_id_fallbacks() {
        let direct = parse_login("omar", &json!({"token": "t", "userId": "u-1"})).unwrap();
        assert_eq!(direct.user_id, "u-1");

        let numeric = parse_login("omar", &json!({"token": "t", "id": 42})).unwrap();
        assert_eq!(numeric.user_id, "42");

        let nested = parse_login("omar", &json!({"token": "t", "user": {"id": 7}})).unwrap();
        assert_eq!(nested.user_id, "7");
        assert_eq!(nested.token, "t");
    }

    #[test]
    fn test_parse_login_missing_fields() {
        let err = parse_login("omar", &json!({"userId": 1})).unwrap_err();
        assert!(matches!(err, Error::MalformedAuthResponse { ref field, .. } if field == "token"));

        let err = parse_login("omar", &json!({"token": "t", "userId": ""})).unwrap_err();
        assert!(matches!(err, Error::MalformedAuthResponse { ref field, .. } if field == "userId"));
    }

    fn timecard_item(project: &str) -> WorkItem {
        let fields: BTreeMap<String, String> = [
            ("workTypeCt", "2"),
            ("projectId", project),
            ("typeTaskCt", "5"),
            ("description", "Sprint review"),
            ("date", "2025-01-06"),
            ("start", "2025-01-06T09:00:00.000Z"),
            ("end", "2025-01-06T10:30:00.000Z"),
            ("hours", "1.5"),
            ("startTime", "09:00"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        WorkItem::new(0, fields)
    }

    #[test]
    fn test_timecard_payload_shape() {
        let request = TimecardRecord::from_item(&timecard_item(""), "99")
            .unwrap()
            .into_insert()
            .unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "tri_timecard");
        assert_eq!(body["userId"], "99");
        assert_eq!(body["data"]["statusCt"], "1");
        assert_eq!(body["data"]["projectId"], Value::Null);
        assert_eq!(body["data"]["start"], "2025-01-06T13:00:00.000Z");
        assert_eq!(body["data"]["end"], "2025-01-06T14:30:00.000Z");
        assert_eq!(body["data"]["userId"], "99");
        assert!(body["data"].get("startTime").is_none());
    }

    #[test]
    fn test_timecard_keeps_project() {
        let record = TimecardRecord::from_item(&timecard_item("p-12"), "99").unwrap();
        assert_eq!(record.project_id.as_deref(), Some("p-12"));
    }
}

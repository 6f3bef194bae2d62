use crate::api::{CrmApi, Page, Record, Search, Trigger, WriteOutcome};
use crate::error::{CrmError, Result};
use crate::mapping::parse_attachment;
use annals_core::{Attachment, StagedFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

const API_PREFIX: &str = "crm/v6";
const USERS_MODULE: &str = "users";
const ATTACHMENT_FIELDS: &str = "id,File_Name,$file_id";

/// Zoho CRM v6 REST client.
#[derive(Debug, Clone)]
pub struct RestCrm {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl RestCrm {
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(CrmError::MissingToken);
        }
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .user_agent("annals")
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url,
            access_token: token.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.join(API_PREFIX)?;
        url.path_segments_mut()
            .map_err(|_| CrmError::UnexpectedResponse("base url cannot be a base".to_string()))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = method.as_str(), url = url.as_str(), "crm request");
        self.client
            .request(method, url)
            .header("Authorization", format!("Zoho-oauthtoken {}", self.access_token))
    }

    async fn read(&self, builder: RequestBuilder) -> Result<Option<Value>> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CrmError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn read_list(&self, builder: RequestBuilder, key: &str) -> Result<Vec<Record>> {
        let Some(body) = self.read(builder).await? else {
            return Ok(Vec::new());
        };
        records_under(&body, key)
    }

    async fn write(&self, builder: RequestBuilder) -> Result<WriteOutcome> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "crm write response");
        let parsed: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body)?
        };
        match parsed
            .get("data")
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
        {
            Some(entry) => Ok(WriteOutcome::from_entry(entry)),
            None if status.is_success() => Ok(WriteOutcome::success(None, parsed)),
            None => {
                let code = parsed
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or("HTTP_ERROR")
                    .to_string();
                Ok(WriteOutcome::error(&code, &error_message(&body), parsed))
            }
        }
    }
}

fn records_under(body: &Value, key: &str) -> Result<Vec<Record>> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object().cloned().ok_or_else(|| {
                    CrmError::UnexpectedResponse(format!("{key} entry is not an object"))
                })
            })
            .collect(),
        Some(_) => Err(CrmError::UnexpectedResponse(format!(
            "{key} is not an array"
        ))),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn write_body(record: Record, triggers: &[Trigger]) -> Value {
    let triggers: Vec<&str> = triggers.iter().map(|trigger| trigger.as_str()).collect();
    json!({ "data": [record], "trigger": triggers })
}

fn data_key(module: &str) -> &'static str {
    if module == USERS_MODULE {
        "users"
    } else {
        "data"
    }
}

#[async_trait]
impl CrmApi for RestCrm {
    async fn insert_record(
        &self,
        module: &str,
        record: Record,
        triggers: &[Trigger],
    ) -> Result<WriteOutcome> {
        let url = self.endpoint(&[module])?;
        let builder = self
            .request(Method::POST, url)
            .json(&write_body(record, triggers));
        self.write(builder).await
    }

    async fn update_record(
        &self,
        module: &str,
        id: &str,
        record: Record,
        triggers: &[Trigger],
    ) -> Result<WriteOutcome> {
        let url = self.endpoint(&[module, id])?;
        let builder = self
            .request(Method::PUT, url)
            .json(&write_body(record, triggers));
        self.write(builder).await
    }

    async fn delete_record(&self, module: &str, id: &str) -> Result<WriteOutcome> {
        let url = self.endpoint(&[module, id])?;
        self.write(self.request(Method::DELETE, url)).await
    }

    async fn get_record(&self, module: &str, id: &str) -> Result<Option<Record>> {
        let url = self.endpoint(&[module, id])?;
        let records = self
            .read_list(self.request(Method::GET, url), data_key(module))
            .await?;
        Ok(records.into_iter().next())
    }

    async fn get_related_records(
        &self,
        module: &str,
        id: &str,
        related_list: &str,
        fields: &[&str],
        page: Page,
    ) -> Result<Vec<Record>> {
        let mut url = self.endpoint(&[module, id, related_list])?;
        {
            let mut query = url.query_pairs_mut();
            if !fields.is_empty() {
                query.append_pair("fields", &fields.join(","));
            }
            query
                .append_pair("page", &page.page.to_string())
                .append_pair("per_page", &page.per_page.to_string());
        }
        self.read_list(self.request(Method::GET, url), "data").await
    }

    async fn search_records(
        &self,
        module: &str,
        search: &Search,
        page: Page,
    ) -> Result<Vec<Record>> {
        let mut url = self.endpoint(&[module, "search"])?;
        let (key, value) = search.query_pair();
        url.query_pairs_mut()
            .append_pair(key, value)
            .append_pair("page", &page.page.to_string())
            .append_pair("per_page", &page.per_page.to_string());
        self.read_list(self.request(Method::GET, url), "data").await
    }

    async fn list_attachments(&self, module: &str, id: &str) -> Result<Vec<Attachment>> {
        let mut url = self.endpoint(&[module, id, "Attachments"])?;
        url.query_pairs_mut().append_pair("fields", ATTACHMENT_FIELDS);
        let records = self.read_list(self.request(Method::GET, url), "data").await?;
        records
            .iter()
            .map(|record| parse_attachment("Attachments", record))
            .collect()
    }

    async fn upload_attachment(
        &self,
        module: &str,
        id: &str,
        file: &StagedFile,
    ) -> Result<WriteOutcome> {
        let url = self.endpoint(&[module, id, "Attachments"])?;
        let part = Part::bytes(file.content().to_vec()).file_name(file.file_name().to_string());
        let form = Form::new().part("file", part);
        self.write(self.request(Method::POST, url).multipart(form))
            .await
    }

    async fn delete_attachment(
        &self,
        module: &str,
        id: &str,
        attachment_id: &str,
    ) -> Result<WriteOutcome> {
        let url = self.endpoint(&[module, id, "Attachments", attachment_id])?;
        self.write(self.request(Method::DELETE, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::{records_under, write_body, RestCrm};
    use crate::api::{Record, Trigger};
    use crate::error::CrmError;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn endpoint_appends_api_prefix() {
        let crm = RestCrm::new("https://www.zohoapis.eu", "token", Duration::from_secs(5))
            .expect("client");
        let url = crm.endpoint(&["History1", "42", "Attachments"]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://www.zohoapis.eu/crm/v6/History1/42/Attachments"
        );
    }

    #[test]
    fn new_rejects_blank_token() {
        let err = RestCrm::new("https://www.zohoapis.com", "  ", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, CrmError::MissingToken));
    }

    #[test]
    fn write_body_wraps_record() {
        let mut record = Record::new();
        record.insert("Name".to_string(), json!("Ada"));
        let body = write_body(record, &[Trigger::Workflow]);
        assert_eq!(
            body,
            json!({"data": [{"Name": "Ada"}], "trigger": ["workflow"]})
        );
    }

    #[test]
    fn records_under_handles_missing_key() {
        assert!(records_under(&json!({}), "data").expect("records").is_empty());
        let users = records_under(&json!({"users": [{"id": "1"}]}), "users").expect("users");
        assert_eq!(users.len(), 1);
        assert!(records_under(&json!({"data": "nope"}), "data").is_err());
    }
}

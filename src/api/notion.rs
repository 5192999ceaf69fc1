use crate::models::{
    AssignmentRecord, ExistingAssignment, NotionDatabase, NotionPage, QueryDatabaseResponse,
    SelectOption,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

const API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// What happened to one record during an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(token: String, database_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            token,
            database_id,
        }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token)).unwrap(),
        );
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let url = format!("{}/{}", API_BASE, path);
        let mut request = self.client.request(method, &url).headers(self.build_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .context(format!("Failed to send request to {}", url))?;

        let status = response.status();
        let response_text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!(
                "Notion API request failed with status {} for URL {}\nResponse body: {}",
                status,
                url,
                response_text
            );
        }

        serde_json::from_str(&response_text).with_context(|| {
            format!(
                "Failed to parse JSON response from {}. Response body (first 500 chars): {}",
                url,
                &response_text.chars().take(500).collect::<String>()
            )
        })
    }

    async fn query_database(&self, start_cursor: Option<&str>) -> Result<QueryDatabaseResponse> {
        let mut body = json!({});
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = json!(cursor);
        }
        self.request(
            Method::POST,
            &format!("databases/{}/query", self.database_id),
            Some(&body),
        )
        .await
    }

    async fn retrieve_database(&self) -> Result<NotionDatabase> {
        self.request(Method::GET, &format!("databases/{}", self.database_id), None)
            .await
    }

    async fn update_database(&self, properties: Value) -> Result<NotionDatabase> {
        self.request(
            Method::PATCH,
            &format!("databases/{}", self.database_id),
            Some(&json!({ "properties": properties })),
        )
        .await
    }

    async fn create_page(&self, properties: Value) -> Result<NotionPage> {
        self.request(
            Method::POST,
            "pages",
            Some(&json!({
                "parent": { "database_id": self.database_id },
                "properties": properties,
            })),
        )
        .await
    }

    async fn update_page(&self, page_id: &str, properties: Value) -> Result<NotionPage> {
        self.request(
            Method::PATCH,
            &format!("pages/{}", page_id),
            Some(&json!({ "properties": properties })),
        )
        .await
    }

    /// Fetch all assignments already in the database, keyed by title.
    pub async fn existing_assignments(&self) -> Result<IndexMap<String, ExistingAssignment>> {
        let mut existing = IndexMap::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0;

        loop {
            let response = self.query_database(cursor.as_deref()).await?;

            for page in &response.results {
                // Pages without a readable title are not ours to touch
                let name = match page_title(&page.properties) {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                existing.insert(
                    name,
                    ExistingAssignment {
                        page_id: page.id.clone(),
                        due: page_due(&page.properties).map(str::to_string),
                    },
                );
            }

            if !response.has_more {
                break;
            }
            cursor = response.next_cursor;

            pages_fetched += 1;
            // Guard against a misbehaving cursor paginating forever
            if pages_fetched > 100 {
                break;
            }
        }

        Ok(existing)
    }

    /// Ensure an option exists on a select property, creating it if needed.
    /// Returns the option id, or `None` when creation fails (the record is
    /// still created, just without that select).
    async fn ensure_select_option(
        &self,
        property_name: &str,
        option_name: &str,
    ) -> Result<Option<String>> {
        let db = self.retrieve_database().await?;
        let options = select_options(&db.properties, property_name).with_context(|| {
            format!("Property '{}' is not a select property", property_name)
        })?;

        if let Some(option) = options.iter().find(|o| o.name == option_name) {
            return Ok(option.id.clone());
        }

        // Notion replaces the whole option list on schema update, so the
        // existing options (id/name/color only) ride along with the new one.
        let mut new_options = options;
        new_options.push(SelectOption {
            id: None,
            name: option_name.to_string(),
            color: Some("default".to_string()),
        });

        let updated = match self
            .update_database(json!({ property_name: { "select": { "options": new_options } } }))
            .await
        {
            Ok(db) => db,
            Err(e) => {
                eprintln!("Error creating select option '{}': {}", option_name, e);
                return Ok(None);
            }
        };
        println!("Created select option '{}' for '{}'", option_name, property_name);

        Ok(select_options(&updated.properties, property_name)
            .and_then(|options| options.into_iter().find(|o| o.name == option_name))
            .and_then(|option| option.id))
    }

    /// Create the record, or update its due date when it changed. Existing
    /// pages keep every other field untouched.
    pub async fn upsert_assignment(
        &self,
        record: &AssignmentRecord,
        existing: &IndexMap<String, ExistingAssignment>,
    ) -> Result<SyncAction> {
        let due_str = record.due.map(|d| d.format("%Y-%m-%d").to_string());
        let reminder_str = record.reminder.map(|d| d.format("%Y-%m-%d").to_string());

        if let Some(current) = existing.get(&record.assignment_name) {
            if current.due == due_str {
                return Ok(SyncAction::Unchanged);
            }
            self.update_page(
                &current.page_id,
                json!({ "Due": { "date": due_str.map(|d| json!({ "start": d })) } }),
            )
            .await?;
            return Ok(SyncAction::Updated);
        }

        let course_id = self.ensure_select_option("Course", &record.course_name).await?;
        let project_id = self.ensure_select_option("Project", &record.project).await?;

        let mut properties = json!({
            "Name": { "title": [ { "text": { "content": record.assignment_name } } ] },
            "Status": { "status": { "name": "To-do" } },
            "Due": { "date": due_str.map(|d| json!({ "start": d })) },
            "Reminder/Start/Unlock": { "date": reminder_str.map(|d| json!({ "start": d })) },
        });
        if let Some(id) = course_id {
            properties["Course"] = json!({ "select": { "id": id } });
        }
        if let Some(id) = project_id {
            properties["Project"] = json!({ "select": { "id": id } });
        }

        self.create_page(properties).await?;
        Ok(SyncAction::Created)
    }

    /// Import scraped assignments, continuing past per-record failures.
    pub async fn import_assignments(&self, records: &[AssignmentRecord]) -> Result<()> {
        let existing = self
            .existing_assignments()
            .await
            .context("Failed to fetch existing assignments from Notion")?;

        let mut synced = 0;
        for record in records {
            match self.upsert_assignment(record, &existing).await {
                Ok(SyncAction::Created) => {
                    println!("Created: {}", record.assignment_name);
                    synced += 1;
                }
                Ok(SyncAction::Updated) => {
                    println!("Updated: {}", record.assignment_name);
                    synced += 1;
                }
                Ok(SyncAction::Unchanged) => synced += 1,
                Err(e) => eprintln!("Error syncing '{}': {}", record.assignment_name, e),
            }
        }

        println!("\nImported {} assignments to Notion.", synced);
        Ok(())
    }
}

/// The plain-text title of a page's "Name" property.
fn page_title(properties: &Value) -> Option<&str> {
    properties
        .get("Name")?
        .get("title")?
        .get(0)?
        .get("plain_text")?
        .as_str()
}

/// The stored due date ("YYYY-MM-DD") of a page's "Due" property.
fn page_due(properties: &Value) -> Option<&str> {
    properties.get("Due")?.get("date")?.get("start")?.as_str()
}

/// The options of a select property in a database schema.
fn select_options(properties: &Value, property_name: &str) -> Option<Vec<SelectOption>> {
    let options = properties.get(property_name)?.get("select")?.get("options")?;
    serde_json::from_value(options.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_due_from_page_properties() {
        let properties = json!({
            "Name": { "title": [ { "plain_text": "Project 1 - HW1" } ] },
            "Due": { "date": { "start": "2026-04-25" } },
        });

        assert_eq!(page_title(&properties), Some("Project 1 - HW1"));
        assert_eq!(page_due(&properties), Some("2026-04-25"));
    }

    #[test]
    fn tolerates_missing_or_empty_properties() {
        let properties = json!({
            "Name": { "title": [] },
            "Due": { "date": null },
        });

        assert_eq!(page_title(&properties), None);
        assert_eq!(page_due(&properties), None);
        assert_eq!(page_title(&json!({})), None);
    }

    #[test]
    fn reads_select_options_from_schema() {
        let properties = json!({
            "Course": {
                "select": {
                    "options": [
                        { "id": "abc", "name": "CPSC 221", "color": "blue" },
                        { "id": "def", "name": "CPSC 210" },
                    ]
                }
            }
        });

        let options = select_options(&properties, "Course").unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id.as_deref(), Some("abc"));
        assert_eq!(options[0].name, "CPSC 221");
        assert_eq!(options[1].color, None);

        assert!(select_options(&properties, "Project").is_none());
    }
}

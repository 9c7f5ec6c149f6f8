//! Remote document store over HTTP.
//!
//! Feedback lives in a `feedbacks` collection on a JSON document API:
//!
//! - `GET  {base}/feedbacks?userId={student}` returns the student's records,
//!   either as a bare array or wrapped as `{"documents": [...]}`.
//! - `POST {base}/feedbacks` stores one record.
//!
//! The server is not trusted to filter by day, and documents may come back
//! in any offset (many stores normalise to UTC). `records_on` reads each
//! timestamp in the caller's offset client-side.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use url::Url;

use super::config::RemoteConfig;
use super::FeedbackStore;
use crate::clock::LocalDay;
use crate::error::{Result, StoreError};
use crate::feedback::FeedbackRecord;

const COLLECTION: &str = "feedbacks";

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<FeedbackRecord>),
    Wrapped { documents: Vec<FeedbackRecord> },
}

impl ListResponse {
    fn into_records(self) -> Vec<FeedbackRecord> {
        match self {
            ListResponse::Bare(records) | ListResponse::Wrapped { documents: records } => records,
        }
    }
}

/// Feedback store backed by a remote document API, for multi-device use.
pub struct RemoteStore {
    collection_url: Url,
    api_key: Option<String>,
    http_client: Client,
    runtime: tokio::runtime::Runtime,
}

impl RemoteStore {
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let collection_url = collection_url(base_url)?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::from)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Runtime(e.to_string()))?;

        Ok(Self {
            collection_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            http_client,
            runtime,
        })
    }

    /// # Errors
    /// Returns an error if the configured URL is empty or invalid.
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn fetch_all(&self, student_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut().append_pair("userId", student_id);

        let mut request = self.http_client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = check_status(request.send().await?).await?;
        let list: ListResponse = resp.json().await?;
        Ok(list.into_records())
    }

    async fn post(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let mut request = self.http_client.post(self.collection_url.clone()).json(record);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        check_status(request.send().await?).await?;
        Ok(())
    }
}

fn collection_url(base_url: &str) -> Result<Url, StoreError> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(StoreError::InvalidUrl("remote base_url is not configured".to_string()));
    }
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(COLLECTION)?)
}

async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl FeedbackStore for RemoteStore {
    fn records_on(&self, student_id: &str, day: LocalDay) -> Result<Vec<FeedbackRecord>> {
        let records = self.runtime.block_on(self.fetch_all(student_id))?;
        Ok(records
            .into_iter()
            .filter(|r| r.student_id == student_id && day.contains(r.submitted_at))
            .collect())
    }

    fn history(&self, student_id: &str) -> Result<Vec<FeedbackRecord>> {
        let mut records: Vec<_> = self
            .runtime
            .block_on(self.fetch_all(student_id))?
            .into_iter()
            .filter(|r| r.student_id == student_id)
            .collect();
        records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        tracing::debug!(count = records.len(), "fetched remote feedback history");
        Ok(records)
    }

    fn append(&mut self, record: &FeedbackRecord) -> Result<()> {
        self.runtime.block_on(self.post(record))?;
        tracing::debug!(id = %record.id, meal = %record.meal_slot, "stored feedback remotely");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::feedback::Rating;
    use crate::meal::MealSlot;
    use crate::student::{MessType, StudentProfile};
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use mockito::Matcher;

    fn ist_day(day: u32) -> LocalDay {
        let ist = FixedOffset::east_opt(19800).unwrap();
        LocalDay::of(ist.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap())
    }

    const BODY: &str = r#"[
        {"id":"1","userId":"asha@campus.edu","rating":4,"comment":"","mealType":"lunch",
         "messType":"Veg","caterer":"Sodexo","date":"2024-06-10T12:40:00+05:30"},
        {"id":"2","userId":"asha@campus.edu","rating":2,"comment":"cold","mealType":"dinner",
         "messType":"Veg","caterer":"Sodexo","date":"2024-06-09T23:50:00+05:30"},
        {"id":"3","userId":"asha@campus.edu","rating":5,"mealType":"breakfast",
         "messType":"veg","caterer":"Sodexo","date":"2024-06-10T07:10:00+05:30"}
    ]"#;

    fn store(server: &mockito::Server, api_key: Option<&str>) -> RemoteStore {
        RemoteStore::new(
            &server.url(),
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn collection_url_keeps_base_path() {
        let url = collection_url("https://docs.example.com/v1/projects/mess").unwrap();
        assert_eq!(url.as_str(), "https://docs.example.com/v1/projects/mess/feedbacks");
        assert!(collection_url("").is_err());
        assert!(collection_url("not a url").is_err());
    }

    #[test]
    fn records_on_filters_by_local_date() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/feedbacks")
            .match_query(Matcher::UrlEncoded("userId".into(), "asha@campus.edu".into()))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create();

        let store = store(&server, Some("secret"));
        let today = store.records_on("asha@campus.edu", ist_day(10)).unwrap();
        mock.assert();

        let mut slots: Vec<_> = today.iter().map(|r| r.meal_slot).collect();
        slots.sort_by_key(|s| s.as_str());
        assert_eq!(slots, vec![MealSlot::Breakfast, MealSlot::Lunch]);
    }

    #[test]
    fn records_on_reads_utc_documents_in_callers_offset() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/feedbacks")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"id":"z","userId":"asha@campus.edu","rating":3,"mealType":"dinner",
                     "messType":"Veg","caterer":"Sodexo","date":"2024-06-10T20:00:00Z"}]"#,
            )
            .create();

        // 20:00Z is 01:30 on the 11th in +05:30.
        let store = store(&server, None);
        assert!(store.records_on("asha@campus.edu", ist_day(10)).unwrap().is_empty());
        let next = store.records_on("asha@campus.edu", ist_day(11)).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(
            LocalDay::of(next[0].submitted_at).date(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
    }

    #[test]
    fn history_accepts_wrapped_documents_newest_first() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/feedbacks")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(r#"{{"documents": {BODY}}}"#))
            .create();

        let history = store(&server, None).history("asha@campus.edu").unwrap();
        let ids: Vec<_> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);
    }

    #[test]
    fn append_posts_record_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/feedbacks")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "userId": "asha@campus.edu",
                "mealType": "snacks",
                "rating": 3,
                "messType": "Veg",
            })))
            .with_status(201)
            .create();

        let student = StudentProfile {
            name: "Asha".to_string(),
            email: "asha@campus.edu".to_string(),
            registration_number: "21BCE1234".to_string(),
            year_of_study: "3".to_string(),
            mess_type: MessType::Veg,
            caterer: "Sodexo".to_string(),
        };
        let at = FixedOffset::east_opt(19800)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 10, 17, 20, 0)
            .unwrap();
        let record = FeedbackRecord::new(&student, MealSlot::Snacks, Rating::new(3).unwrap(), "", at);

        let mut store = store(&server, None);
        store.append(&record).unwrap();
        mock.assert();
    }

    #[test]
    fn server_error_is_reported_with_status() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/feedbacks")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create();

        let err = store(&server, None).history("asha@campus.edu").unwrap_err();
        match err {
            CoreError::Store(StoreError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

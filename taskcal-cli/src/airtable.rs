//! Airtable implementation of the record-store gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskcal_core::gateway::{GatewayError, RecordFilter, RecordQuery, RecordStore};
use taskcal_core::record::{RecordPatch, TaskRecord};

use crate::config::AirtableConfig;
use crate::http::{check_status, transport_error};

const API_BASE: &str = "https://api.airtable.com/v0";

pub struct AirtableStore {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct RecordPage {
    records: Vec<TaskRecord>,
}

#[derive(Serialize)]
struct PatchPayload<'a> {
    records: &'a [RecordPatch],
    /// Lets label writes land in choice columns without pre-registering
    /// the option.
    typecast: bool,
}

impl AirtableStore {
    pub fn new(cfg: &AirtableConfig) -> Self {
        AirtableStore {
            http: reqwest::Client::new(),
            url: format!("{API_BASE}/{}/{}", cfg.base, cfg.table),
            api_key: cfg.api_key.clone(),
        }
    }

    fn formula(filter: RecordFilter) -> &'static str {
        match filter {
            RecordFilter::ActiveDeadlines => "AND(NOT({Deadline}=''), NOT({lastStatus}='Done'))",
            RecordFilter::TodayUnscheduled => {
                "AND({Timeframe}='Today', NOT({Status}='Done'), {setTodayDate}='')"
            }
        }
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<TaskRecord>, GatewayError> {
        let mut params: Vec<(&str, String)> = vec![
            ("filterByFormula", Self::formula(query.filter).to_string()),
            ("maxRecords", query.max_records.to_string()),
        ];
        for field in query.fields {
            params.push(("fields[]", (*field).to_string()));
        }

        let response = self
            .http
            .get(&self.url)
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let page: RecordPage = response.json().await.map_err(transport_error)?;
        Ok(page.records)
    }

    async fn patch_batch(&self, patches: &[RecordPatch]) -> Result<(), GatewayError> {
        let payload = PatchPayload {
            records: patches,
            typecast: true,
        };

        let response = self
            .http
            .patch(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

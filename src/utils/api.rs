use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};
use reqwest::Client;
use serde_json::{to_string_pretty, Value};
use urlencoding::encode;

// Both the initial fetch and the backlog re-fetch share this bounded wait.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// Raw copy of the last fetched document, kept around for inspection only.
const DEBUG_DUMP_PATH: &str = "api_response.json";

pub struct ResultsApi {
    client: Client,
    base_url: String,
}

impl ResultsApi {
    // Builds the shared HTTP client used for every lookup.
    pub fn new(base_url: String) -> Result<ResultsApi> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build the client")?;

        Ok(ResultsApi { client, base_url })
    }

    // Asynchronously retrieves the raw result document for a roll number.
    // Transport failures and non-2xx statuses surface as errors here; the
    // caller decides what the user gets to see.
    pub async fn fetch_academic_result(&self, roll_number: &str) -> Result<Value> {
        let url = format!(
            "{}/getAcademicResult?rollNumber={}",
            self.base_url,
            encode(roll_number)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send results request")?
            .error_for_status()
            .context("Results API returned an error status")?;

        let document = response
            .json::<Value>()
            .await
            .context("Failed to decode the results response")?;

        info!("Result document fetched for {}", roll_number);
        self.dump_for_debug(&document);

        Ok(document)
    }

    // Writes the fetched document to a local file for debugging. Failures are
    // logged and swallowed; the user-facing flow never depends on this file.
    fn dump_for_debug(&self, document: &Value) {
        match to_string_pretty(document) {
            Ok(pretty) => {
                if let Err(e) = fs::write(DEBUG_DUMP_PATH, pretty) {
                    error!("Error saving API response: {}", e);
                }
            }
            Err(e) => error!("Error serializing API response: {}", e),
        }
    }
}

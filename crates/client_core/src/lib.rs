use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::ClinicalTestId,
    protocol::{FetchClinicalTestResponse, UpdateClinicalTestRequest, UpdateClinicalTestResponse},
};
use tracing::{debug, info};
use url::Url;

pub mod config;
mod controller;
pub mod error;
pub mod form;

pub use controller::{
    Alert, EditClinicalTestController, LoadOutcome, Route, ScreenEvent, ScreenPhase, SubmitError,
    SubmitOutcome,
};
pub use error::ClientError;
pub use form::ClinicalTestForm;

/// Remote clinical-test service as seen by the edit screen.
#[async_trait]
pub trait ClinicalTestsApi: Send + Sync {
    async fn fetch_clinical_test(
        &self,
        id: &ClinicalTestId,
    ) -> Result<FetchClinicalTestResponse, ClientError>;

    async fn update_clinical_test(
        &self,
        id: &ClinicalTestId,
        request: &UpdateClinicalTestRequest,
    ) -> Result<UpdateClinicalTestResponse, ClientError>;
}

pub struct HttpClinicalTestsApi {
    http: Client,
    base_url: Url,
}

impl HttpClinicalTestsApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            base_url: config::parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn fetch_url(&self, id: &ClinicalTestId) -> Result<Url, ClientError> {
        self.endpoint(&["api", "clinical-tests", "clinical-testsById", id.as_str()])
    }

    pub fn update_url(&self, id: &ClinicalTestId) -> Result<Url, ClientError> {
        self.endpoint(&["api", "clinical-tests", "clinical-tests", id.as_str()])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "api base url cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        url: &Url,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ClinicalTestsApi for HttpClinicalTestsApi {
    async fn fetch_clinical_test(
        &self,
        id: &ClinicalTestId,
    ) -> Result<FetchClinicalTestResponse, ClientError> {
        let url = self.fetch_url(id)?;
        debug!(%url, "fetching clinical test");

        let response = self.http.get(url.clone()).send().await?;
        let body: FetchClinicalTestResponse = Self::read_json(response, &url).await?;
        info!(
            clinical_test_id = %id,
            success = body.success,
            has_data = body.data.is_some(),
            "clinical test fetch response"
        );
        Ok(body)
    }

    async fn update_clinical_test(
        &self,
        id: &ClinicalTestId,
        request: &UpdateClinicalTestRequest,
    ) -> Result<UpdateClinicalTestResponse, ClientError> {
        let url = self.update_url(id)?;
        info!(%url, "update url");

        let response = self.http.put(url.clone()).json(request).send().await?;
        let body: UpdateClinicalTestResponse = Self::read_json(response, &url).await?;
        info!(
            clinical_test_id = %id,
            success = body.success,
            "clinical test update response"
        );
        Ok(body)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

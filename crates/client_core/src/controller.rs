//! Form controller for the clinical-test edit screen: load on mount, mirror
//! edits, validate and submit.

use std::{fmt, sync::Arc};

use chrono::Utc;
use shared::{domain::ClinicalTestId, domain::FormField, error::ValidationError};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{error::ClientError, form::ClinicalTestForm, ClinicalTestsApi};

const FETCH_FAILED_MESSAGE: &str = "Failed to fetch clinical test details. Please try again later.";
const UPDATE_FAILED_MESSAGE: &str =
    "Failed to update clinical test details. Please check your input and try again.";
const VITAL_SIGNS_MISSING_MESSAGE: &str = "Please fill in all vital signs fields.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenPhase {
    Loading,
    Ready,
    Submitting,
    NavigatedAway,
}

impl ScreenPhase {
    /// Whether the form accepts edits and submissions in this phase.
    /// `Submitting` stays open so a repeated tap can issue another write.
    pub fn accepts_input(self) -> bool {
        matches!(self, ScreenPhase::Ready | ScreenPhase::Submitting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route(pub String);

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A blocking, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    fn fetch_failed() -> Self {
        Self::new("Error", FETCH_FAILED_MESSAGE)
    }

    fn update_failed() -> Self {
        Self::new("Error", UPDATE_FAILED_MESSAGE)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[derive(Debug, Clone)]
pub enum ScreenEvent {
    PhaseChanged(ScreenPhase),
    FormLoaded(ClinicalTestForm),
    FieldUpdated { field: FormField, value: String },
    Alert(Alert),
    Navigate(Route),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Populated,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Navigated(Route),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("server rejected the update")]
    Rejected { message: Option<String> },
    #[error("screen is not accepting submissions while {phase:?}")]
    NotReady { phase: ScreenPhase },
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SubmitError {
    /// The alert shown to the user for this failure.
    pub fn alert(&self) -> Alert {
        match self {
            SubmitError::Validation(ValidationError::MissingVitalSigns { .. }) => {
                Alert::new("Validation Error", VITAL_SIGNS_MISSING_MESSAGE)
            }
            _ => Alert::update_failed(),
        }
    }
}

struct ScreenState {
    phase: ScreenPhase,
    form: ClinicalTestForm,
}

pub struct EditClinicalTestController {
    api: Arc<dyn ClinicalTestsApi>,
    clinical_test_id: ClinicalTestId,
    list_route: Route,
    inner: Mutex<ScreenState>,
    events: broadcast::Sender<ScreenEvent>,
}

impl EditClinicalTestController {
    pub fn new(
        api: Arc<dyn ClinicalTestsApi>,
        clinical_test_id: ClinicalTestId,
        list_route: Route,
    ) -> Self {
        info!(%clinical_test_id, "mounting clinical test editor");
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            clinical_test_id,
            list_route,
            inner: Mutex::new(ScreenState {
                phase: ScreenPhase::Loading,
                form: ClinicalTestForm::default(),
            }),
            events,
        }
    }

    pub fn clinical_test_id(&self) -> &ClinicalTestId {
        &self.clinical_test_id
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ScreenEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> ScreenPhase {
        self.inner.lock().await.phase
    }

    pub async fn form(&self) -> ClinicalTestForm {
        self.inner.lock().await.form.clone()
    }

    pub async fn render(&self) -> String {
        let guard = self.inner.lock().await;
        if guard.phase == ScreenPhase::Loading {
            return "Loading...\n".to_string();
        }
        guard.form.render()
    }

    pub async fn load(&self) -> LoadOutcome {
        let id = &self.clinical_test_id;
        let outcome = match self.api.fetch_clinical_test(id).await {
            Ok(response) => match response.into_record() {
                Some(record) => {
                    let form = ClinicalTestForm::from_record(&record);
                    info!(clinical_test_id = %id, ?form, "loaded clinical test");
                    self.inner.lock().await.form = form.clone();
                    self.emit(ScreenEvent::FormLoaded(form));
                    LoadOutcome::Populated
                }
                None => {
                    warn!(clinical_test_id = %id, "no clinical test data found for the provided id");
                    LoadOutcome::NotFound
                }
            },
            Err(err) => {
                error!(clinical_test_id = %id, "error fetching clinical test details: {err}");
                self.emit(ScreenEvent::Alert(Alert::fetch_failed()));
                LoadOutcome::Failed
            }
        };

        self.set_phase(ScreenPhase::Ready).await;
        outcome
    }

    /// Replaces one field. Ignored outside `Ready`/`Submitting`; returns
    /// whether the edit was applied.
    pub async fn update_field(&self, field: FormField, value: impl Into<String>) -> bool {
        let value = value.into();
        {
            let mut guard = self.inner.lock().await;
            if !guard.phase.accepts_input() {
                warn!(
                    clinical_test_id = %self.clinical_test_id,
                    %field,
                    phase = ?guard.phase,
                    "ignoring field edit"
                );
                return false;
            }
            guard.form.set(field, value.clone());
        }
        self.emit(ScreenEvent::FieldUpdated { field, value });
        true
    }

    pub async fn update_field_by_name(
        &self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let field = name.parse::<FormField>()?;
        self.update_field(field, value).await;
        Ok(())
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, SubmitError> {
        let form = {
            let mut guard = self.inner.lock().await;
            if !guard.phase.accepts_input() {
                warn!(
                    clinical_test_id = %self.clinical_test_id,
                    phase = ?guard.phase,
                    "ignoring submit"
                );
                return Err(SubmitError::NotReady { phase: guard.phase });
            }
            guard.phase = ScreenPhase::Submitting;
            guard.form.clone()
        };
        self.emit(ScreenEvent::PhaseChanged(ScreenPhase::Submitting));

        match self.try_submit(&form).await {
            Ok(route) => {
                info!(clinical_test_id = %self.clinical_test_id, "clinical test details updated");
                self.set_phase(ScreenPhase::NavigatedAway).await;
                self.emit(ScreenEvent::Navigate(route.clone()));
                Ok(SubmitOutcome::Navigated(route))
            }
            Err(err) => {
                error!(
                    clinical_test_id = %self.clinical_test_id,
                    "error updating clinical test details: {err}"
                );
                self.emit(ScreenEvent::Alert(err.alert()));
                self.set_phase(ScreenPhase::Ready).await;
                Err(err)
            }
        }
    }

    async fn try_submit(&self, form: &ClinicalTestForm) -> Result<Route, SubmitError> {
        let request = form.to_update_request(Utc::now())?;
        info!(clinical_test_id = %self.clinical_test_id, ?request, "updating with data");

        let response = self
            .api
            .update_clinical_test(&self.clinical_test_id, &request)
            .await?;

        if !response.success {
            warn!(
                clinical_test_id = %self.clinical_test_id,
                reason = response.message.as_deref().unwrap_or_default(),
                "server reported update failure"
            );
            return Err(SubmitError::Rejected {
                message: response.message,
            });
        }
        Ok(self.list_route.clone())
    }

    async fn set_phase(&self, phase: ScreenPhase) {
        self.inner.lock().await.phase = phase;
        self.emit(ScreenEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: ScreenEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

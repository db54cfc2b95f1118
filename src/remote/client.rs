//! HTTP implementation of the remote plan store.
//!
//! This module talks to the plan store's REST API with `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::RemoteError;
use crate::model::{DayId, PlanExerciseId, PlanId};

use super::store::{RemotePlanStore, RemoteResult};
use super::types::{
    BearerToken, DayPayload, DayUpdate, ExercisePayload, PlanPayload, RemoteDay, RemoteExercise,
    RemotePlan,
};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for read requests.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 500;

/// REST client for the remote plan store.
#[derive(Debug, Clone)]
pub struct HttpPlanStore {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
}

impl HttpPlanStore {
    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: &BearerToken) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        trace!("{method} {url}");
        self.client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token.as_str()))
    }

    /// Issues a read request, retrying transport failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &BearerToken,
        path: &str,
        resource: &str,
    ) -> RemoteResult<T> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES} for {resource}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            let result = match self.request(Method::GET, path, token).send().await {
                Ok(response) => Self::decode(response, resource).await,
                Err(e) => Err(RemoteError::network(format!("Request failed: {e}"))),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| RemoteError::network("Max retries exceeded")))
    }

    /// Issues a mutating request exactly once and decodes the response body.
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        resource: &str,
    ) -> RemoteResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::network(format!("Request failed: {e}")))?;
        Self::decode(response, resource).await
    }

    /// Issues a mutating request exactly once, ignoring the response body.
    async fn send_empty(request: RequestBuilder, resource: &str) -> RemoteResult<()> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::network(format!("Request failed: {e}")))?;
        Self::check_status(response, resource).await.map(|_| ())
    }

    async fn decode<T: DeserializeOwned>(response: Response, resource: &str) -> RemoteResult<T> {
        let response = Self::check_status(response, resource).await?;
        response.json().await.map_err(|e| RemoteError::InvalidResponse {
            message: format!("Failed to parse {resource}: {e}"),
        })
    }

    /// Maps error statuses onto [`RemoteError`].
    async fn check_status(response: Response, resource: &str) -> RemoteResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(RemoteError::not_found(resource)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Unauthorized {
                message: if body.is_empty() {
                    String::from("Invalid or expired token")
                } else {
                    body
                },
            }),
            _ => Err(RemoteError::Rejected {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

#[async_trait]
impl RemotePlanStore for HttpPlanStore {
    async fn create_plan(&self, token: &BearerToken, plan: &PlanPayload) -> RemoteResult<PlanId> {
        #[derive(Deserialize)]
        struct Created {
            plan_id: PlanId,
        }

        let request = self.request(Method::POST, "/plans", token).json(plan);
        let created: Created = Self::send_json(request, "plan").await?;
        Ok(created.plan_id)
    }

    async fn update_plan(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        plan: &PlanPayload,
    ) -> RemoteResult<()> {
        let request = self
            .request(Method::PUT, &format!("/plans/{plan_id}"), token)
            .json(plan);
        Self::send_empty(request, &format!("plan {plan_id}")).await
    }

    async fn delete_plan(&self, token: &BearerToken, plan_id: PlanId) -> RemoteResult<()> {
        let request = self.request(Method::DELETE, &format!("/plans/{plan_id}"), token);
        Self::send_empty(request, &format!("plan {plan_id}")).await
    }

    async fn fetch_plan(&self, token: &BearerToken, plan_id: PlanId) -> RemoteResult<RemotePlan> {
        self.get_json(token, &format!("/plans/{plan_id}"), &format!("plan {plan_id}"))
            .await
    }

    async fn fetch_days(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
    ) -> RemoteResult<Vec<RemoteDay>> {
        self.get_json(
            token,
            &format!("/plans/{plan_id}/days"),
            &format!("days of plan {plan_id}"),
        )
        .await
    }

    async fn create_day(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day: &DayPayload,
    ) -> RemoteResult<DayId> {
        #[derive(Deserialize)]
        struct Created {
            plan_day_id: DayId,
        }

        let request = self
            .request(Method::POST, &format!("/plans/{plan_id}/days"), token)
            .json(day);
        let created: Created = Self::send_json(request, &format!("plan {plan_id}")).await?;
        Ok(created.plan_day_id)
    }

    async fn update_day(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        day: &DayUpdate,
    ) -> RemoteResult<()> {
        let request = self
            .request(Method::PUT, &format!("/plans/{plan_id}/days/{day_id}"), token)
            .json(day);
        Self::send_empty(request, &format!("day {day_id} of plan {plan_id}")).await
    }

    async fn delete_day(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
    ) -> RemoteResult<()> {
        let request = self.request(
            Method::DELETE,
            &format!("/plans/{plan_id}/days/{day_id}"),
            token,
        );
        Self::send_empty(request, &format!("day {day_id} of plan {plan_id}")).await
    }

    async fn fetch_exercises(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
    ) -> RemoteResult<Vec<RemoteExercise>> {
        self.get_json(
            token,
            &format!("/plans/{plan_id}/days/{day_id}/exercises"),
            &format!("exercises of day {day_id}"),
        )
        .await
    }

    async fn add_exercise(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        exercise: &ExercisePayload,
    ) -> RemoteResult<PlanExerciseId> {
        #[derive(Deserialize)]
        struct Created {
            plan_exercise_id: PlanExerciseId,
        }

        let request = self
            .request(
                Method::POST,
                &format!("/plans/{plan_id}/days/{day_id}/exercises"),
                token,
            )
            .json(exercise);
        let created: Created = Self::send_json(
            request,
            &format!("exercise {} for day {day_id}", exercise.exercise_id),
        )
        .await?;
        Ok(created.plan_exercise_id)
    }

    async fn remove_exercise(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        entry_id: PlanExerciseId,
    ) -> RemoteResult<()> {
        let request = self.request(
            Method::DELETE,
            &format!("/plans/{plan_id}/days/{day_id}/exercises/{entry_id}"),
            token,
        );
        Self::send_empty(request, &format!("exercise entry {entry_id} of day {day_id}")).await
    }
}

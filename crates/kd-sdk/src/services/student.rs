use super::{id_value, Decision, DecisionBody};
use crate::client::Client;
use crate::error::Result;
use crate::request::{ApiRequest, MultipartForm};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Apply {
    job_id: Value,
}

/// Student-side endpoints
#[derive(Debug, Clone, Copy)]
pub struct StudentApi<'a> {
    client: &'a Client,
}

impl<'a> StudentApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.send(ApiRequest::get(format!("/StudentInfors/{id}"))).await
    }

    pub async fn my_profile(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/StudentInfors/MyProfile")).await
    }

    pub async fn job_suggestions(&self, id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::get(format!("/StudentInfors/JobSuggestions/{id}")))
            .await
    }

    /// Create or update the profile, avatar and resume included
    pub async fn save_info(&self, form: MultipartForm) -> Result<Value> {
        self.client
            .send(ApiRequest::post("/StudentInfors").with_multipart(form))
            .await
    }

    pub async fn categories(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/Categories")).await
    }

    pub async fn company(&self, id: &str) -> Result<Value> {
        self.client.send(ApiRequest::get(format!("/CompanyInfors/{id}"))).await
    }

    pub async fn apply(&self, job_id: &str) -> Result<Value> {
        let request = ApiRequest::post("/UserJobs/Apply").with_json(&Apply {
            job_id: id_value(job_id),
        })?;
        self.client.send(request).await
    }

    pub async fn my_applications(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/UserJobs/MyApplications")).await
    }

    pub async fn my_invitations(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/UserJobs/MyInvitations")).await
    }

    /// Withdraw an application
    pub async fn delete_application(&self, id: &str) -> Result<Value> {
        self.client.send(ApiRequest::post(format!("/UserJobs/{id}"))).await
    }

    pub async fn respond_invitation(&self, id: &str, decision: Decision) -> Result<Value> {
        let request = ApiRequest::post(format!("/UserJobs/RespondInvitation/{id}"))
            .with_json(&DecisionBody { status: decision })?;
        self.client.send(request).await
    }
}

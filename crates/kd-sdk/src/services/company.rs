use super::{id_value, Decision, DecisionBody};
use crate::client::Client;
use crate::error::Result;
use crate::request::{ApiRequest, MultipartForm};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendInvitation<'a> {
    student_user_id: &'a str,
    job_id: Value,
}

/// Company-side endpoints
#[derive(Debug, Clone, Copy)]
pub struct CompanyApi<'a> {
    client: &'a Client,
}

impl<'a> CompanyApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create or update the company profile, logo included
    pub async fn update_info(&self, form: MultipartForm) -> Result<Value> {
        self.client
            .send(ApiRequest::post("/CompanyInfors").with_multipart(form))
            .await
    }

    pub async fn my_info(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/CompanyInfors/MyCompany")).await
    }

    pub async fn all_received_applications(&self) -> Result<Value> {
        self.client
            .send(ApiRequest::get("/UserJobs/AllReceivedApplications"))
            .await
    }

    pub async fn received_applications(&self, job_id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::get(format!("/UserJobs/ReceivedApplications/{job_id}")))
            .await
    }

    pub async fn respond_application(&self, id: &str, decision: Decision) -> Result<Value> {
        let request = ApiRequest::post(format!("/UserJobs/RespondApplication/{id}"))
            .with_json(&DecisionBody { status: decision })?;
        self.client.send(request).await
    }

    pub async fn accept_application(&self, id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::post(format!("/UserJobs/AcceptApplication/{id}")))
            .await
    }

    pub async fn reject_application(&self, id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::post(format!("/UserJobs/RejectApplication/{id}")))
            .await
    }

    pub async fn sent_invitations(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/UserJobs/SentInvitations")).await
    }

    pub async fn send_invitation(&self, student_user_id: &str, job_id: &str) -> Result<Value> {
        let request = ApiRequest::post("/UserJobs/SendInvitation").with_json(&SendInvitation {
            student_user_id,
            job_id: id_value(job_id),
        })?;
        self.client.send(request).await
    }

    pub async fn delete_invitation(&self, id: &str) -> Result<Value> {
        self.client.send(ApiRequest::post(format!("/UserJobs/{id}"))).await
    }
}

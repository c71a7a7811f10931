use crate::client::Client;
use crate::error::Result;
use crate::request::ApiRequest;
use serde_json::Value;

/// `/Jobs` and `/Categories` endpoints
#[derive(Debug, Clone, Copy)]
pub struct JobsApi<'a> {
    client: &'a Client,
}

impl<'a> JobsApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, job: &Value) -> Result<Value> {
        self.client.send(ApiRequest::post("/Jobs").with_json(job)?).await
    }

    pub async fn list(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/Jobs")).await
    }

    /// Jobs posted by the logged-in company
    pub async fn mine(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/Jobs/MyJobs")).await
    }

    pub async fn categories(&self) -> Result<Value> {
        self.client.send(ApiRequest::get("/Categories")).await
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.send(ApiRequest::get(format!("/Jobs/{id}"))).await
    }

    /// Students the server recommends for a job
    pub async fn candidate_suggestions(&self, id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::get(format!("/Jobs/CandidateSuggestions/{id}")))
            .await
    }

    pub async fn update(&self, id: &str, job: &Value) -> Result<Value> {
        self.client
            .send(ApiRequest::post(format!("/Jobs/{id}")).with_json(job)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Value> {
        self.client.send(ApiRequest::post(format!("/Jobs/{id}"))).await
    }
}

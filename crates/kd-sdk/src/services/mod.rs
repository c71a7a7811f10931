//! Entity services
//!
//! Thin wrappers over the session pipeline, one call per endpoint. Payloads
//! are returned as the pipeline produced them. All mutations use `POST`,
//! including updates and deletes, keeping the verbs the browser client
//! sends.
// TODO: confirm against the server whether job update/delete and the
// `/UserJobs/{id}` deletes accept PUT/DELETE, then switch the verbs.

mod auth;
mod company;
mod jobs;
mod student;

pub use auth::{AuthApi, LoginRequest, LoginResponse};
pub use company::CompanyApi;
pub use jobs::JobsApi;
pub use student::StudentApi;

use crate::client::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answer to an application or an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accepted,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accepted => f.write_str("Accepted"),
            Decision::Rejected => f.write_str("Rejected"),
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accepted" | "accept" => Ok(Decision::Accepted),
            "rejected" | "reject" => Ok(Decision::Rejected),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// `{ "status": "Accepted" }`
#[derive(Debug, Serialize)]
struct DecisionBody {
    status: Decision,
}

/// Numeric ids go out as JSON numbers, anything else as a string
fn id_value(id: &str) -> serde_json::Value {
    id.parse::<i64>()
        .map(serde_json::Value::from)
        .unwrap_or_else(|_| serde_json::Value::from(id))
}

impl Client {
    /// Registration, login and logout
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Job posts and categories
    pub fn jobs(&self) -> JobsApi<'_> {
        JobsApi::new(self)
    }

    /// Company profile, received applications and invitations
    pub fn company(&self) -> CompanyApi<'_> {
        CompanyApi::new(self)
    }

    /// Student profile, applications and invitations
    pub fn student(&self) -> StudentApi<'_> {
        StudentApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_wire_format() {
        let body = DecisionBody { status: Decision::Rejected };
        assert_eq!(serde_json::to_value(body).unwrap(), json!({ "status": "Rejected" }));
    }

    #[test]
    fn test_numeric_ids_are_sent_as_numbers() {
        assert_eq!(id_value("42"), json!(42));
        assert_eq!(id_value("a1b2"), json!("a1b2"));
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!("accepted".parse::<Decision>().unwrap(), Decision::Accepted);
        assert_eq!("Reject".parse::<Decision>().unwrap(), Decision::Rejected);
        assert!("maybe".parse::<Decision>().is_err());
    }
}

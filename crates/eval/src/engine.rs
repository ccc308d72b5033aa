//! Request orchestration: schema gate, policies, schema gate, envelope.

use praxis_core::Value;
use praxis_schema::Schema;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::ProcessError;
use crate::policy::{PolicyExecutionResult, PolicyRegistry};
use crate::report::FailureReport;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Inbound envelope. `data` must be an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    pub data: Value,
    pub policies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub timestamp: String,
    pub status: String,
    pub processed_data: Value,
}

/// Policies plus optional request and response schemas.
///
/// Read-only once built, so one engine can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    request_schema: Option<Schema>,
    response_schema: Option<Schema>,
    policies: PolicyRegistry,
}

impl Engine {
    pub fn new(policies: PolicyRegistry) -> Self {
        Engine {
            policies,
            ..Self::default()
        }
    }

    pub fn with_request_schema(mut self, schema: Schema) -> Self {
        self.request_schema = Some(schema);
        self
    }

    pub fn with_response_schema(mut self, schema: Schema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn request_schema(&self) -> Option<&Schema> {
        self.request_schema.as_ref()
    }

    pub fn response_schema(&self) -> Option<&Schema> {
        self.response_schema.as_ref()
    }

    /// Run the named policies over `doc`, mutating it in place.
    pub fn execute_policies(
        &self,
        doc: &mut Value,
        names: &[String],
    ) -> (Vec<PolicyExecutionResult>, bool) {
        self.policies.execute(doc, names)
    }

    /// Deserialize a raw request body and process it.
    pub fn process_request(&self, raw: &[u8]) -> Result<Response, ProcessError> {
        let request: Request = serde_json::from_slice(raw)
            .map_err(|e| ProcessError::MalformedRequest(e.to_string()))?;
        self.process(request)
    }

    pub fn process(&self, request: Request) -> Result<Response, ProcessError> {
        let Request {
            id, data, policies, ..
        } = request;
        if !matches!(data, Value::Object(_)) {
            return Err(ProcessError::MalformedRequest(format!(
                "'data' must be an object, found {}",
                data.type_name()
            )));
        }
        info!(request_id = %id, policies = ?policies, "processing request");

        if let Some(schema) = &self.request_schema {
            let errors = schema.validate(&data);
            if !errors.is_empty() {
                warn!(request_id = %id, violations = errors.len(), "request data rejected");
                return Err(ProcessError::RequestValidation(errors));
            }
        }

        let mut data = data;
        let (results, all_passed) = self.execute_policies(&mut data, &policies);
        if !all_passed {
            warn!(request_id = %id, "policy execution failed");
            return Err(ProcessError::PolicyFailure(FailureReport::new(results)));
        }

        if let Some(schema) = &self.response_schema {
            let errors = schema.validate(&data);
            if !errors.is_empty() {
                warn!(request_id = %id, violations = errors.len(), "processed data rejected");
                return Err(ProcessError::ResponseValidation(errors));
            }
        }

        info!(request_id = %id, "request processed");
        Ok(Response {
            id: format!("{}-response", id),
            timestamp: now_rfc3339(),
            status: "success".to_string(),
            processed_data: data,
        })
    }
}

fn now_rfc3339() -> String {
    // Rfc3339 only fails for years outside 0..=9999.
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

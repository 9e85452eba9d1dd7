use crate::store::StoreError;
use crate::validation::ValidationErrors;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ValidationErrors> for HandlerErr {
    fn from(e: ValidationErrors) -> Self {
        Self {
            code: "validation_failed",
            message: e.to_string(),
            details: Some(json!({ "fieldErrors": e.0 })),
        }
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        let (code, details) = match &e {
            StoreError::UnknownEmployee(id) => {
                ("reference_not_found", Some(json!({ "employee": id })))
            }
            StoreError::UnknownGrantedLoan(id) => {
                ("reference_not_found", Some(json!({ "grantLoan": id })))
            }
            StoreError::NoEditTarget | StoreError::NoDeleteTarget => ("no_target", None),
            StoreError::InstallmentNotFound(id) => ("not_found", Some(json!({ "id": id }))),
        };
        Self {
            code,
            message: e.to_string(),
            details,
        }
    }
}

/// Collapses a handler outcome into the wire envelope.
pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}

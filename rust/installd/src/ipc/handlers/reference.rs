use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_employees(state: &mut AppState, req: &Request) -> serde_json::Value {
    let reference = state.store.reference();
    ok(
        &req.id,
        json!({
            "employees": reference.employees(),
            "options": reference.employee_options()
        }),
    )
}

fn handle_granted_loans(state: &mut AppState, req: &Request) -> serde_json::Value {
    let reference = state.store.reference();
    ok(
        &req.id,
        json!({
            "grantedLoans": reference.granted_loans(),
            "options": reference.granted_loan_options()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reference.employees" => Some(handle_employees(state, req)),
        "reference.grantedLoans" => Some(handle_granted_loans(state, req)),
        _ => None,
    }
}

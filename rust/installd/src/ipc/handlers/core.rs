use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::reference::Seed;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "seedPath": state.seed_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            "employeeCount": state.store.reference().employees().len(),
            "grantedLoanCount": state.store.reference().granted_loans().len(),
            "installmentCount": state.store.installments().len()
        }),
    )
}

fn handle_seed_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match Seed::from_file(&path) {
        Ok(seed) => {
            state.store.reset(seed);
            state.seed_path = Some(path.clone());
            ok(
                &req.id,
                json!({
                    "seedPath": path.to_string_lossy(),
                    "employeeCount": state.store.reference().employees().len(),
                    "grantedLoanCount": state.store.reference().granted_loans().len(),
                    "installmentCount": state.store.installments().len()
                }),
            )
        }
        Err(e) => {
            log::warn!("seed load failed: {e:#}");
            err(&req.id, "seed_load_failed", format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "seed.load" => Some(handle_seed_load(state, req)),
        _ => None,
    }
}

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::validation::{validate_create, validate_update, InstallmentForm, InstallmentUpdateForm};
use serde::de::DeserializeOwned;
use serde_json::json;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

fn parse_form<T: DeserializeOwned + Default>(params: &serde_json::Value) -> Result<T, HandlerErr> {
    if params.is_null() {
        return Ok(T::default());
    }
    if !params.is_object() {
        return Err(HandlerErr::bad_params("params must be an object"));
    }
    serde_json::from_value(params.clone()).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

fn required_id(req: &Request) -> Result<String, HandlerErr> {
    req.params
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| HandlerErr::bad_params("missing id"))
}

fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "installments": state.store.installments() }))
}

fn handle_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let form: InstallmentForm = parse_form(&req.params)?;
    let validated = validate_create(&form)?;
    let (installment, notice) = state.store.create(validated)?;
    Ok(json!({ "installment": installment, "notice": notice }))
}

fn handle_edit_target_set(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_id(req)?;
    state.store.set_edit_target(id);
    Ok(json!({ "targets": state.store.targets() }))
}

fn handle_edit_target_clear(state: &mut AppState, _req: &Request) -> HandlerResult {
    state.store.clear_edit_target();
    Ok(json!({ "targets": state.store.targets() }))
}

fn handle_delete_target_set(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_id(req)?;
    state.store.set_delete_target(id);
    Ok(json!({ "targets": state.store.targets() }))
}

fn handle_delete_target_clear(state: &mut AppState, _req: &Request) -> HandlerResult {
    state.store.clear_delete_target();
    Ok(json!({ "targets": state.store.targets() }))
}

fn handle_targets(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "targets": state.store.targets() }))
}

fn handle_edit_form(state: &mut AppState, _req: &Request) -> HandlerResult {
    let values = state.store.edit_form()?;
    Ok(json!({ "values": values }))
}

fn handle_update(state: &mut AppState, req: &Request) -> HandlerResult {
    let form: InstallmentUpdateForm = parse_form(&req.params)?;
    let patch = validate_update(&form)?;
    // Capture the id first: a successful edit clears the target.
    let id = state.store.edit_target().map(str::to_string);
    let notice = state.store.edit(&patch)?;
    let installment = id.as_deref().and_then(|id| state.store.get(id));
    Ok(json!({ "installment": installment, "notice": notice }))
}

fn handle_delete(state: &mut AppState, _req: &Request) -> HandlerResult {
    let (deleted_id, notice) = state.store.delete()?;
    Ok(json!({ "deletedId": deleted_id, "notice": notice }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> HandlerResult = match req.method.as_str() {
        "installments.list" => handle_list,
        "installments.create" => handle_create,
        "installments.editTarget.set" => handle_edit_target_set,
        "installments.editTarget.clear" => handle_edit_target_clear,
        "installments.deleteTarget.set" => handle_delete_target_set,
        "installments.deleteTarget.clear" => handle_delete_target_clear,
        "installments.targets" => handle_targets,
        "installments.editForm" => handle_edit_form,
        "installments.update" => handle_update,
        "installments.delete" => handle_delete,
        _ => return None,
    };
    Some(respond(&req.id, handler(state, req)))
}

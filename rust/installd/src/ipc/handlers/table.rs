use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::table::{ColumnId, ColumnSort, Pagination, TableStateUpdate, Updater};
use serde_json::json;
use std::collections::BTreeSet;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

fn snapshot(state: &AppState) -> serde_json::Value {
    json!({
        "state": state.store.table_state(),
        "view": state.store.view()
    })
}

fn handle_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(snapshot(state))
}

fn handle_update(state: &mut AppState, req: &Request) -> HandlerResult {
    let key = req
        .params
        .get("key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing key"))?;
    let value = req
        .params
        .get("value")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing value"))?;
    let update = TableStateUpdate::replace_from_json(key, value).map_err(HandlerErr::bad_params)?;
    state.store.update_table_view_state(update);
    Ok(snapshot(state))
}

fn handle_set_filter(state: &mut AppState, req: &Request) -> HandlerResult {
    let filter_text = req
        .params
        .get("filterText")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing filterText"))?
        .to_string();
    state
        .store
        .update_table_view_state(TableStateUpdate::Filter(Updater::Replace(filter_text)));
    state
        .store
        .update_table_view_state(TableStateUpdate::Pagination(Updater::transform(
            Pagination::first_page,
        )));
    Ok(snapshot(state))
}

fn handle_toggle_sort(state: &mut AppState, req: &Request) -> HandlerResult {
    let raw = req
        .params
        .get("columnId")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing columnId"))?;
    let column: ColumnId = serde_json::from_value(raw)
        .map_err(|e| HandlerErr::bad_params(format!("invalid columnId: {e}")))?;
    if !column.is_sortable() {
        return Err(HandlerErr::bad_params("column sl is not sortable"));
    }
    state
        .store
        .update_table_view_state(TableStateUpdate::Sorting(Updater::transform(
            move |s: &ColumnSort| s.toggled(column),
        )));
    state
        .store
        .update_table_view_state(TableStateUpdate::Pagination(Updater::transform(
            Pagination::first_page,
        )));
    Ok(snapshot(state))
}

fn handle_next_page(state: &mut AppState, _req: &Request) -> HandlerResult {
    let filtered = state.store.view().filtered_count;
    state
        .store
        .update_table_view_state(TableStateUpdate::Pagination(Updater::transform(
            move |p: &Pagination| p.next(filtered),
        )));
    Ok(snapshot(state))
}

fn handle_previous_page(state: &mut AppState, _req: &Request) -> HandlerResult {
    state
        .store
        .update_table_view_state(TableStateUpdate::Pagination(Updater::transform(
            Pagination::previous,
        )));
    Ok(snapshot(state))
}

fn handle_set_page_size(state: &mut AppState, req: &Request) -> HandlerResult {
    let page_size = req
        .params
        .get("pageSize")
        .and_then(|v| v.as_u64())
        .and_then(|v| usize::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| HandlerErr::bad_params("pageSize must be a positive integer"))?;
    state
        .store
        .update_table_view_state(TableStateUpdate::Pagination(Updater::transform(
            move |p: &Pagination| p.resized(page_size),
        )));
    Ok(snapshot(state))
}

fn handle_toggle_row(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = req
        .params
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing id"))?
        .to_string();
    if state.store.get(&id).is_none() {
        return Err(HandlerErr {
            code: "not_found",
            message: format!("installment {id} not found"),
            details: Some(json!({ "id": id })),
        });
    }
    state
        .store
        .update_table_view_state(TableStateUpdate::RowSelection(Updater::transform(
            move |selected: &BTreeSet<String>| {
                let mut next = selected.clone();
                if !next.remove(&id) {
                    next.insert(id);
                }
                next
            },
        )));
    Ok(snapshot(state))
}

fn handle_toggle_page_rows(state: &mut AppState, _req: &Request) -> HandlerResult {
    let (page_ids, all_selected) = {
        let view = state.store.view();
        (view.page_ids(), view.all_page_rows_selected)
    };
    state
        .store
        .update_table_view_state(TableStateUpdate::RowSelection(Updater::transform(
            move |selected: &BTreeSet<String>| {
                let mut next = selected.clone();
                for id in page_ids {
                    if all_selected {
                        next.remove(&id);
                    } else {
                        next.insert(id);
                    }
                }
                next
            },
        )));
    Ok(snapshot(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> HandlerResult = match req.method.as_str() {
        "table.get" => handle_get,
        "table.update" => handle_update,
        "table.setFilter" => handle_set_filter,
        "table.toggleSort" => handle_toggle_sort,
        "table.nextPage" => handle_next_page,
        "table.previousPage" => handle_previous_page,
        "table.setPageSize" => handle_set_page_size,
        "table.toggleRow" => handle_toggle_row,
        "table.togglePageRows" => handle_toggle_page_rows,
        _ => return None,
    };
    Some(respond(&req.id, handler(state, req)))
}

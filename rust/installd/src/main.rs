mod ipc;
mod model;
mod reference;
mod store;
mod table;
mod validation;

use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const SEED_ENV: &str = "INSTALLD_SEED";

fn initial_state() -> anyhow::Result<ipc::AppState> {
    let seed_path = std::env::var_os(SEED_ENV).map(PathBuf::from);
    let seed = match &seed_path {
        Some(path) => reference::Seed::from_file(path)
            .with_context(|| format!("{SEED_ENV} points at an unusable seed"))?,
        None => reference::Seed::embedded()?,
    };
    Ok(ipc::AppState {
        store: store::InstallmentStore::new(seed),
        seed_path,
    })
}

fn main() -> anyhow::Result<()> {
    // stdout carries responses; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut state = initial_state()?;
    log::info!(
        "installd ready with {} installments",
        state.store.installments().len()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("dropping malformed request: {e}");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}

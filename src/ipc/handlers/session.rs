use crate::auth::Authenticator;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::str_param;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let username = match str_param(req, "username") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match str_param(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // Without an open gradebook, fall back to the configured credentials.
    let accepted = match state.gradebook.as_ref() {
        Some(gb) => gb.authenticate(username, password),
        None => state.config.authenticator().authenticate(username, password),
    };
    if !accepted {
        log::warn!("login rejected for {username}");
        return err(&req.id, "unauthorized", "invalid username or password", None);
    }

    state.authenticated = true;
    log::info!("{username} logged in");
    ok(&req.id, json!({ "authenticated": true }))
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.authenticated = !state.config.require_login;
    ok(&req.id, json!({ "authenticated": state.authenticated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        _ => None,
    }
}

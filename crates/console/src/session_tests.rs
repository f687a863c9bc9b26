// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn creds() -> Credentials {
    Credentials { username: "operator".to_owned(), password: "1234".to_owned() }
}

#[test]
fn first_session_is_adopted_then_matched_then_rejected() {
    let mut gate = SessionGate::new();
    assert_eq!(gate.on_authorization_required(SessionId::new(7)), GateAction::Prompt);
    assert_eq!(gate.id(), SessionId::new(7));
    assert_eq!(gate.on_authorization_required(SessionId::new(7)), GateAction::Prompt);
    assert_eq!(gate.on_authorization_required(SessionId::new(9)), GateAction::Reload);
    // The held id is not replaced by the stale server's id.
    assert_eq!(gate.id(), SessionId::new(7));
}

#[test]
fn check_maps_mismatch_to_typed_error() {
    let mut gate = SessionGate::new();
    assert!(gate.check(SessionId::new(1)).is_ok());
    let err = gate.check(SessionId::new(2));
    assert_eq!(
        err,
        Err(ConsoleError::SessionMismatch { local: SessionId::new(1), remote: SessionId::new(2) })
    );
}

#[test]
fn accepted_marks_authorized_until_next_requirement() {
    let mut gate = SessionGate::new();
    gate.on_authorization_required(SessionId::new(3));
    assert!(!gate.is_authorized());
    gate.on_authentication_accepted();
    assert!(gate.is_authorized());
    gate.on_authorization_required(SessionId::new(3));
    assert!(!gate.is_authorized());
}

#[test]
fn login_frame_requires_a_session() {
    let gate = SessionGate::new();
    assert!(gate.login_frame(&creds()).is_none());
}

#[test]
fn login_frame_is_hex_session_then_credentials() {
    let mut gate = SessionGate::new();
    gate.on_authorization_required(SessionId::new(0x1A2B));
    assert_eq!(gate.login_frame(&creds()).as_deref(), Some("1A2B\noperator\n1234"));
}

#[yare::parameterized(
    upper = { "\"1A2B\"", 0x1A2B },
    lower = { "\"ff\"", 0xff },
    prefixed = { "\"0x10\"", 0x10 },
    number_digits_are_hex = { "42", 0x42 },
)]
fn session_id_deserializes(json: &str, expected: u64) {
    let id = serde_json::from_str::<SessionId>(json).ok();
    assert_eq!(id.map(|id| id.get()), Some(expected));
}

#[test]
fn numeric_session_is_echoed_back_unchanged() -> anyhow::Result<()> {
    let mut gate = SessionGate::new();
    gate.on_authorization_required(serde_json::from_str::<SessionId>("10")?);
    assert_eq!(gate.login_frame(&creds()).as_deref(), Some("10\noperator\n1234"));
    Ok(())
}

#[test]
fn session_id_rejects_garbage() {
    assert!(serde_json::from_str::<SessionId>("\"not-hex\"").is_err());
}

#[test]
fn credentials_debug_hides_password() {
    let shown = format!("{:?}", creds());
    assert!(shown.contains("operator"));
    assert!(!shown.contains("1234"));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::protocol::{AreaStateKind, ZoneBitmapKind, ZoneCondition};
use crate::session::SessionId;
use crate::status::CommandStatus;

use super::*;
use crate::test_support::Recorder;

fn dispatcher() -> (Dispatcher<Recorder>, StatusIndicator) {
    let status = StatusIndicator::new(Duration::from_secs(2));
    (Dispatcher::new(status.clone(), Recorder::default()), status)
}

fn auth_required(session: &str) -> String {
    format!(r#"{{"typeId":19,"typeDesc":"{session}","replyText":""}}"#)
}

#[tokio::test]
async fn failed_reply_shows_command_and_text_and_keeps_session() {
    let (mut d, status) = dispatcher();
    assert_eq!(d.handle_frame(&auth_required("7")), Flow::Login);
    d.handle_frame(r#"{"typeId":20,"typeDesc":"ok"}"#);
    let before = d.panel().clone();

    let flow = d.handle_frame(
        r#"{"typeId":1,"typeDesc":"default","success":0,"command":"ZONE 1 STATE","replyText":"busy"}"#,
    );

    assert_eq!(flow, Flow::Continue);
    assert_eq!(
        status.current(),
        CommandStatus { text: "ZONE 1 STATE (error)".to_owned(), tone: Tone::Error }
    );
    assert_eq!(
        d.view().last().as_ref(),
        Some(&Notice::CommandFailed { command: "ZONE 1 STATE".to_owned(), reply: "busy".to_owned() })
    );
    assert_eq!(d.gate().id(), SessionId::new(7));
    assert!(d.gate().is_authorized());
    assert_eq!(d.panel(), &before);
}

#[tokio::test]
async fn successful_reply_flashes_status() {
    let (mut d, status) = dispatcher();
    d.handle_frame(r#"{"typeId":1,"success":1,"command":"AREA 1 SET","replyText":""}"#);
    assert_eq!(status.current().text, "AREA 1 SET (success)");
    assert!(d.view().notices().is_empty());
}

#[tokio::test]
async fn session_sequence_prompts_twice_then_reloads_and_stops() {
    let (mut d, _status) = dispatcher();
    assert_eq!(d.handle_frame(&auth_required("7")), Flow::Login);
    assert_eq!(d.handle_frame(&auth_required("7")), Flow::Login);
    assert_eq!(d.handle_frame(&auth_required("9")), Flow::Reload);
    assert_eq!(
        d.view().last().as_ref(),
        Some(&Notice::SessionChanged { local: SessionId::new(7), remote: SessionId::new(9) })
    );

    // Nothing after the reload is processed.
    let shown = d.view().notices().len();
    assert_eq!(d.handle_frame(r#"{"typeId":8,"areaState":[1]}"#), Flow::Reload);
    assert_eq!(d.handle_frame("garbage"), Flow::Reload);
    assert_eq!(d.view().notices().len(), shown);
    assert!(d.panel().areas(AreaStateKind::Ready).is_empty());
}

#[tokio::test]
async fn all_areas_recorded_and_rendered() {
    let (mut d, status) = dispatcher();
    let states: Vec<String> = (0..32).map(|i| (i % 2).to_string()).collect();
    d.handle_frame(&format!(r#"{{"typeId":4,"areaState":[{}]}}"#, states.join(",")));

    assert_eq!(status.current().text, "AREA 0 STATE (success)");
    assert_eq!(d.panel().areas(AreaStateKind::Armed).len(), 32);
    match d.view().last().as_ref() {
        Some(Notice::Areas { kind: AreaStateKind::Armed, states }) => assert_eq!(states[1], 1),
        other => unreachable!("expected areas notice, got {other:?}"),
    }
}

#[tokio::test]
async fn zone_bitmap_respects_focus() {
    let (mut d, status) = dispatcher();
    let mut bitmap = vec![0u8; 65];
    bitmap[2] = 0b0000_0100; // RIO 101, point 3
    bitmap[3] = 0b0000_0001; // RIO 102, point 1
    let frame = format!(
        r#"{{"typeId":13,"zoneState":[{}]}}"#,
        bitmap.iter().map(u8::to_string).collect::<Vec<_>>().join(",")
    );

    d.set_focus(RioAddress::new(1, 2));
    d.handle_frame(&frame);

    assert_eq!(status.current().text, "ZONES OPEN (success)");
    assert_eq!(
        d.view().last().as_ref(),
        Some(&Notice::ZoneBitmap {
            kind: ZoneBitmapKind::Open,
            rio: RioAddress::new(1, 2),
            zones: vec![ZoneAddress::decode(1021)],
        })
    );
    assert_eq!(d.panel().zones_set(ZoneBitmapKind::Open, None).len(), 2);
}

#[tokio::test]
async fn single_zone_updates_panel() {
    let (mut d, status) = dispatcher();
    d.handle_frame(r#"{"typeId":10,"zoneNumber":1011,"zoneState":6}"#);
    assert_eq!(status.current().text, "ZONE 1011 STATE (success)");
    assert_eq!(d.panel().zone(ZoneAddress::decode(1011)), Some(ZoneCondition::Masked));
}

#[tokio::test]
async fn outputs_reply() {
    let (mut d, status) = dispatcher();
    d.handle_frame(r#"{"typeId":17,"outputState":[16]}"#);
    assert_eq!(status.current().text, "OUTPUT GETALL (success)");
    assert_eq!(
        d.view().last().as_ref(),
        Some(&Notice::Outputs { rio: None, on: vec![crate::address::OutputAddress::decode(1011)] })
    );
}

#[tokio::test]
async fn poll_reports_online_changes_only() {
    let (mut d, _status) = dispatcher();
    let online = r#"{"typeId":18,"panelIsOnline":1,"haveAreaState":0,"haveZoneState":0,
        "haveOutputState":0,"areaState":[0],"zoneState":[0],"outputState":[0]}"#;
    d.handle_frame(online);
    d.handle_frame(online);
    assert_eq!(d.view().notices(), vec![Notice::PanelOnline(true)]);
    assert_eq!(d.panel().online, Some(true));
}

#[tokio::test]
async fn login_required_sets_notice_status() {
    let (mut d, status) = dispatcher();
    let flow = d.handle_frame(r#"{"typeId":19,"typeDesc":"5EED","replyText":"Jane Operator"}"#);
    assert_eq!(flow, Flow::Login);
    assert_eq!(status.current().tone, Tone::Notice);
    assert_eq!(
        d.view().last().as_ref(),
        Some(&Notice::LoginRequired { user: Some("Jane Operator".to_owned()) })
    );

    d.handle_frame(r#"{"typeId":20,"typeDesc":"x"}"#);
    assert!(d.gate().is_authorized());
    assert_eq!(d.view().last().as_ref(), Some(&Notice::LoginAccepted));
}

#[tokio::test]
async fn unknown_and_invalid_frames_continue() {
    let (mut d, _status) = dispatcher();
    assert_eq!(d.handle_frame(r#"{"typeId":42,"x":1}"#), Flow::Continue);
    assert!(matches!(d.view().last().as_ref(), Some(Notice::Unknown { type_id: 42, .. })));
    assert_eq!(d.handle_frame("not json"), Flow::Continue);
    assert_eq!(d.view().notices().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn login_required_status_resets_to_idle() {
    let (mut d, status) = dispatcher();
    d.handle_frame(&auth_required("7"));
    assert_eq!(status.current().text, "Login required!");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(status.current(), CommandStatus::idle());
}

#[tokio::test]
async fn session_mismatch_reports_both_ids_and_finishes() {
    let (mut d, _status) = dispatcher();
    d.handle_frame(&auth_required("1A"));
    assert_eq!(d.handle_frame(&auth_required("1B")), Flow::Reload);
    assert_eq!(
        d.view().last().as_ref(),
        Some(&Notice::SessionChanged { local: SessionId::new(0x1A), remote: SessionId::new(0x1B) })
    );
    // The same session again is still a reload: the instance is finished.
    assert_eq!(d.handle_frame(&auth_required("1A")), Flow::Reload);
}

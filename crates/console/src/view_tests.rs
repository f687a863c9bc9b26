// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn render(notices: Vec<Notice>) -> String {
    let mut view = TerminalView::new(Vec::new());
    for notice in notices {
        view.show(notice);
    }
    String::from_utf8_lossy(&view.into_inner()).into_owned()
}

#[test]
fn sia_line_skips_missing_parts() {
    let sia = SiaMessage {
        account_id: Some("1234".to_owned()),
        event_code: Some("BA".to_owned()),
        event_name: Some("Burglary Alarm".to_owned()),
        event_desc: Some("Burglary zone has been violated".to_owned()),
        address_type: Some("zone".to_owned()),
        address_number: Some("1011".to_owned()),
        date: Some("2016-01-01".to_owned()),
        time: Some("12:00:00".to_owned()),
        ascii: Some("null".to_owned()),
        ..SiaMessage::default()
    };
    assert_eq!(
        Notice::Sia(sia).to_string(),
        "2016-01-01 12:00:00 1234 BA Burglary Alarm | Burglary zone has been violated | zone 1011"
    );
}

#[test]
fn failed_command_names_command_and_reply() {
    let notice = Notice::CommandFailed { command: "ZONE 1 STATE".to_owned(), reply: "busy".to_owned() };
    assert_eq!(notice.to_string(), "error: ZONE 1 STATE: busy");
}

#[yare::parameterized(
    zone = { Notice::Zone { zone: ZoneAddress::decode(1011), condition: ZoneCondition::Open }, "zone 1011: open" },
    omit = { Notice::ZoneOmit { zone: ZoneAddress::decode(2035), omitted: false }, "zone 2035: not omitted" },
    area = { Notice::Area { kind: AreaStateKind::Alarm, state: 1 }, "area alarm: alarm" },
    empty_bitmap = { Notice::ZoneBitmap { kind: ZoneBitmapKind::Tamper, rio: None, zones: vec![] }, "zones tamper: none" },
    outputs = { Notice::Outputs { rio: RioAddress::new(1, 0), on: vec![OutputAddress::decode(1001)] }, "outputs on rio 100: 1001" },
    login = { Notice::LoginRequired { user: None }, "login required" },
    changed = { Notice::SessionChanged { local: SessionId::new(7), remote: SessionId::new(0xA) }, "server session changed (7 -> A), restarting console" },
)]
fn one_liners(notice: Notice, expected: &str) {
    assert_eq!(notice.to_string(), expected);
}

#[test]
fn areas_are_numbered_from_one() {
    let notice = Notice::Areas { kind: AreaStateKind::Armed, states: vec![1, 0] };
    assert_eq!(notice.to_string(), "areas state: 1=armed 2=disarmed");
}

#[test]
fn terminal_hides_idle_and_offline_status() {
    let out = render(vec![
        Notice::Status(CommandStatus::idle()),
        Notice::Status(CommandStatus::offline()),
        Notice::Status(CommandStatus { text: "AREA 0 STATE (success)".to_owned(), tone: Tone::Active }),
        Notice::Connection(ConnectionState::Open),
    ]);
    assert_eq!(out, "-- AREA 0 STATE (success)\n-- connection open\n");
}

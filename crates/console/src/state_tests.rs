// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn zone(nr: u32) -> ZoneAddress {
    ZoneAddress::decode(nr)
}

#[test]
fn empty_until_reported() {
    let panel = PanelState::new();
    assert!(panel.online.is_none());
    assert!(panel.areas(AreaStateKind::Armed).is_empty());
    assert!(panel.zones_set(ZoneBitmapKind::Open, None).is_empty());
    assert!(panel.outputs_on(None).is_empty());
}

#[test]
fn area_replies_are_capped_at_panel_size() {
    let mut panel = PanelState::new();
    panel.record_areas(AreaStateKind::Alarm, &[1; 40]);
    assert_eq!(panel.areas(AreaStateKind::Alarm).len(), AREA_COUNT);
    assert!(panel.areas(AreaStateKind::Ready).is_empty());
}

#[test]
fn bitmap_lists_set_zones() {
    let mut panel = PanelState::new();
    let mut bitmap = vec![0u8; 65];
    bitmap[1] = 0b1000_0001; // RIO 100: points 1 and 8
    bitmap[17] = 0b0000_0010; // RIO 200: point 2
    panel.record_bitmap(ZoneBitmapKind::Open, &bitmap);

    assert_eq!(
        panel.zones_set(ZoneBitmapKind::Open, None),
        vec![zone(1001), zone(1008), zone(2002)]
    );
    let rio = RioAddress::new(2, 0);
    assert_eq!(panel.zones_set(ZoneBitmapKind::Open, rio), vec![zone(2002)]);
    assert!(panel.zones_set(ZoneBitmapKind::Alarm, None).is_empty());
}

#[test]
fn outputs_use_nibbles() {
    let mut panel = PanelState::new();
    // RIO 100 low nibble point 1, RIO 101 high nibble point 4.
    panel.record_outputs(&[0b1000_0001]);
    assert_eq!(
        panel.outputs_on(None),
        vec![OutputAddress::decode(1001), OutputAddress::decode(1014)]
    );
}

#[test]
fn single_zone_records() {
    let mut panel = PanelState::new();
    panel.record_zone(zone(1011), ZoneCondition::Open);
    panel.record_omit(zone(1011), true);
    assert_eq!(panel.zone(zone(1011)), Some(ZoneCondition::Open));
    assert_eq!(panel.is_omitted(zone(1011)), Some(true));
    assert_eq!(panel.zone(zone(1012)), None);
}

#[test]
fn poll_respects_have_flags() {
    let mut panel = PanelState::new();
    panel.apply_poll(&PollReply {
        panel_is_online: true,
        have_area_state: true,
        have_zone_state: false,
        have_output_state: false,
        area_state: vec![3; 32],
        zone_state: vec![0],
        output_state: vec![0],
    });
    assert_eq!(panel.online, Some(true));
    assert_eq!(panel.areas(AreaStateKind::Ready), vec![3u8; 32].as_slice());
    assert!(panel.bitmap(ZoneBitmapKind::Alarm).is_empty());

    panel.apply_poll(&PollReply::default());
    assert_eq!(panel.online, Some(false));
    assert_eq!(panel.areas(AreaStateKind::Ready).len(), 32);
}

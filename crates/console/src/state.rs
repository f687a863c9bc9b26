// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last known panel state, assembled from query and poll replies.

use std::collections::BTreeMap;

use crate::address::{OutputAddress, RioAddress, ZoneAddress};
use crate::protocol::{AreaStateKind, PollReply, ZoneBitmapKind, ZoneCondition, AREA_COUNT};

/// Snapshot of everything the console has been told about the panel.
///
/// Empty vectors mean "never reported".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    /// From poll replies; `None` until the first one arrives.
    pub online: Option<bool>,
    armed: Vec<u8>,
    alarm: Vec<u8>,
    ready: Vec<u8>,
    zones: BTreeMap<ZoneAddress, ZoneCondition>,
    omits: BTreeMap<ZoneAddress, bool>,
    bitmaps: [Vec<u8>; 6],
    outputs: Vec<u8>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    fn areas_mut(&mut self, kind: AreaStateKind) -> &mut Vec<u8> {
        match kind {
            AreaStateKind::Armed => &mut self.armed,
            AreaStateKind::Alarm => &mut self.alarm,
            AreaStateKind::Ready => &mut self.ready,
        }
    }

    pub fn areas(&self, kind: AreaStateKind) -> &[u8] {
        match kind {
            AreaStateKind::Armed => &self.armed,
            AreaStateKind::Alarm => &self.alarm,
            AreaStateKind::Ready => &self.ready,
        }
    }

    /// Record an all-areas reply. Extra values past the panel's 32 areas are dropped.
    pub fn record_areas(&mut self, kind: AreaStateKind, states: &[u8]) {
        let slot = self.areas_mut(kind);
        slot.clear();
        slot.extend(states.iter().take(AREA_COUNT));
    }

    pub fn record_zone(&mut self, zone: ZoneAddress, condition: ZoneCondition) {
        self.zones.insert(zone, condition);
    }

    pub fn zone(&self, zone: ZoneAddress) -> Option<ZoneCondition> {
        self.zones.get(&zone).copied()
    }

    pub fn record_omit(&mut self, zone: ZoneAddress, omitted: bool) {
        self.omits.insert(zone, omitted);
    }

    pub fn is_omitted(&self, zone: ZoneAddress) -> Option<bool> {
        self.omits.get(&zone).copied()
    }

    pub fn record_bitmap(&mut self, kind: ZoneBitmapKind, bitmap: &[u8]) {
        self.bitmaps[bitmap_slot(kind)] = bitmap.to_vec();
    }

    pub fn bitmap(&self, kind: ZoneBitmapKind) -> &[u8] {
        &self.bitmaps[bitmap_slot(kind)]
    }

    /// Zones whose bit is set in the last `kind` bitmap, optionally limited to one RIO.
    pub fn zones_set(&self, kind: ZoneBitmapKind, rio: Option<RioAddress>) -> Vec<ZoneAddress> {
        let bitmap = self.bitmap(kind);
        let rios: Vec<RioAddress> = match rio {
            Some(rio) => vec![rio],
            None => RioAddress::all().collect(),
        };
        rios.into_iter()
            .flat_map(|rio| {
                (1..=ZoneAddress::POINTS).filter_map(move |point| {
                    ZoneAddress::new(rio.line(), rio.rio(), point)
                })
            })
            .filter(|zone| zone.is_set(bitmap))
            .collect()
    }

    pub fn record_outputs(&mut self, states: &[u8]) {
        self.outputs = states.to_vec();
    }

    /// Outputs that are on, optionally limited to one RIO.
    pub fn outputs_on(&self, rio: Option<RioAddress>) -> Vec<OutputAddress> {
        let rios: Vec<RioAddress> = match rio {
            Some(rio) => vec![rio],
            None => RioAddress::all().collect(),
        };
        rios.into_iter()
            .flat_map(|rio| {
                (1..=OutputAddress::POINTS).filter_map(move |point| {
                    OutputAddress::new(rio.line(), rio.rio(), point)
                })
            })
            .filter(|output| output.is_set(&self.outputs))
            .collect()
    }

    /// Fold a poll reply in. Arrays are taken only when their `have*` flag is set.
    ///
    /// The server polls with `AREA 0 READY`, `ZONES ALARM` and `OUTPUT GETALL`.
    pub fn apply_poll(&mut self, poll: &PollReply) {
        self.online = Some(poll.panel_is_online);
        if poll.have_area_state {
            self.record_areas(AreaStateKind::Ready, &poll.area_state);
        }
        if poll.have_zone_state {
            self.record_bitmap(ZoneBitmapKind::Alarm, &poll.zone_state);
        }
        if poll.have_output_state {
            self.record_outputs(&poll.output_state);
        }
    }
}

fn bitmap_slot(kind: ZoneBitmapKind) -> usize {
    match kind {
        ZoneBitmapKind::Ready => 0,
        ZoneBitmapKind::Alarm => 1,
        ZoneBitmapKind::Open => 2,
        ZoneBitmapKind::Tamper => 3,
        ZoneBitmapKind::Resistance => 4,
        ZoneBitmapKind::Omit => 5,
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! openGalaxy command protocol: the JSON envelopes pushed over `/cli`.
//!
//! Every frame is one JSON object discriminated by an integer `typeId`.
//! Parsing yields exactly one [`Envelope`] variant; unknown discriminants are
//! kept as [`Envelope::Unknown`] so newer servers do not break the console.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ConsoleError;
use crate::session::SessionId;

/// Websocket subprotocol spoken on the command socket.
pub const SUBPROTOCOL: &str = "openGalaxy-websocket-protocol";

/// Path of the command socket on the server.
pub const SOCKET_PATH: &str = "/cli";

/// Number of areas on a panel.
pub const AREA_COUNT: usize = 32;

/// Wire discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    SiaMessage = 0,
    StandardReply = 1,
    HelpReply = 2,
    AreaArmedState = 3,
    AllAreaArmedState = 4,
    AreaAlarmState = 5,
    AllAreaAlarmState = 6,
    AreaReadyState = 7,
    AllAreaReadyState = 8,
    ZoneOmitState = 9,
    ZoneState = 10,
    AllZoneReadyState = 11,
    AllZoneAlarmState = 12,
    AllZoneOpenState = 13,
    AllZoneTamperState = 14,
    AllZoneRState = 15,
    AllZoneOmitState = 16,
    AllOutputState = 17,
    PollReply = 18,
    AuthorizationRequired = 19,
    AuthenticationAccepted = 20,
}

impl TypeId {
    const ALL: [Self; 21] = [
        Self::SiaMessage,
        Self::StandardReply,
        Self::HelpReply,
        Self::AreaArmedState,
        Self::AllAreaArmedState,
        Self::AreaAlarmState,
        Self::AllAreaAlarmState,
        Self::AreaReadyState,
        Self::AllAreaReadyState,
        Self::ZoneOmitState,
        Self::ZoneState,
        Self::AllZoneReadyState,
        Self::AllZoneAlarmState,
        Self::AllZoneOpenState,
        Self::AllZoneTamperState,
        Self::AllZoneRState,
        Self::AllZoneOmitState,
        Self::AllOutputState,
        Self::PollReply,
        Self::AuthorizationRequired,
        Self::AuthenticationAccepted,
    ];

    pub fn from_i64(n: i64) -> Option<Self> {
        usize::try_from(n).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Which area property an area envelope reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaStateKind {
    Armed,
    Alarm,
    Ready,
}

impl AreaStateKind {
    /// Keyword used in `AREA <n> <KEYWORD>` queries.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Armed => "STATE",
            Self::Alarm => "ALARM",
            Self::Ready => "READY",
        }
    }

    /// Human label for a raw area value of this kind.
    pub fn describe(self, value: u8) -> &'static str {
        match (self, value) {
            (Self::Armed | Self::Ready, 0) => "disarmed",
            (Self::Armed | Self::Ready, 1) => "armed",
            (Self::Armed | Self::Ready, 2) => "partial",
            (Self::Ready, 3) => "ready",
            (Self::Ready, 4) => "time locked",
            (Self::Alarm, 0) => "normal",
            (Self::Alarm, 1) => "alarm",
            (Self::Alarm, 2) => "reset required",
            _ => "unknown",
        }
    }
}

/// Condition of a single zone (`typeId` 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneCondition {
    TamperShortCircuit,
    LowResistance,
    Closed,
    HighResistance,
    Open,
    TamperOpenCircuit,
    Masked,
    TamperCv,
    Fault,
}

impl ZoneCondition {
    pub fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => Self::TamperShortCircuit,
            1 => Self::LowResistance,
            2 => Self::Closed,
            3 => Self::HighResistance,
            4 => Self::Open,
            5 => Self::TamperOpenCircuit,
            6 => Self::Masked,
            7 => Self::TamperCv,
            8 => Self::Fault,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TamperShortCircuit => "tamper s/c",
            Self::LowResistance => "low resistance",
            Self::Closed => "closed",
            Self::HighResistance => "high resistance",
            Self::Open => "open",
            Self::TamperOpenCircuit => "tamper o/c",
            Self::Masked => "masked",
            Self::TamperCv => "tamper cv",
            Self::Fault => "fault",
        }
    }
}

/// Which bulk zone bitmap a `ZONES <kind>` reply carries (`typeId` 11-16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneBitmapKind {
    Ready,
    Alarm,
    Open,
    Tamper,
    Resistance,
    Omit,
}

impl ZoneBitmapKind {
    pub const ALL: [Self; 6] =
        [Self::Ready, Self::Alarm, Self::Open, Self::Tamper, Self::Resistance, Self::Omit];

    /// Keyword used in the `ZONES <KEYWORD>` query.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Alarm => "ALARM",
            Self::Open => "OPEN",
            Self::Tamper => "TAMPER",
            Self::Resistance => "RSTATE",
            Self::Omit => "OMITTED",
        }
    }

    /// Label for a zone whose bit is set in this bitmap.
    pub fn set_label(self) -> &'static str {
        match self {
            Self::Ready | Self::Open => "open",
            Self::Alarm => "alarm",
            Self::Tamper => "tamper",
            Self::Resistance => "resistance",
            Self::Omit => "omitted",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One SIA alarm message as forwarded by the receiver.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SiaMessage {
    #[serde(rename = "AccountID", default, deserialize_with = "lenient::text")]
    pub account_id: Option<String>,
    #[serde(rename = "EventCode", default, deserialize_with = "lenient::text")]
    pub event_code: Option<String>,
    #[serde(rename = "EventName", default, deserialize_with = "lenient::text")]
    pub event_name: Option<String>,
    #[serde(rename = "EventDesc", default, deserialize_with = "lenient::text")]
    pub event_desc: Option<String>,
    #[serde(rename = "EventAddressType", default, deserialize_with = "lenient::text")]
    pub address_type: Option<String>,
    #[serde(rename = "EventAddressNumber", default, deserialize_with = "lenient::text")]
    pub address_number: Option<String>,
    #[serde(rename = "Date", default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(rename = "Time", default, deserialize_with = "lenient::text")]
    pub time: Option<String>,
    #[serde(rename = "ASCII", default, deserialize_with = "lenient::text")]
    pub ascii: Option<String>,
    #[serde(rename = "SubscriberID", default, deserialize_with = "lenient::text")]
    pub subscriber_id: Option<String>,
    #[serde(rename = "AreaID", default, deserialize_with = "lenient::text")]
    pub area_id: Option<String>,
    #[serde(rename = "PeripheralID", default, deserialize_with = "lenient::text")]
    pub peripheral_id: Option<String>,
}

/// Reply to an ordinary command (`typeId` 1).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardReply {
    #[serde(default)]
    pub command: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub reply_text: String,
}

/// Reply to `HELP` (`typeId` 2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpReply {
    #[serde(default)]
    pub command: String,
    pub help_text: String,
}

/// Periodic panel snapshot pushed while polling is enabled (`typeId` 18).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollReply {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub panel_is_online: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub have_area_state: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub have_zone_state: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub have_output_state: bool,
    #[serde(default)]
    pub area_state: Vec<u8>,
    #[serde(default)]
    pub zone_state: Vec<u8>,
    #[serde(default)]
    pub output_state: Vec<u8>,
}

/// One decoded server-to-client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Sia(SiaMessage),
    StandardReply(StandardReply),
    Help(HelpReply),
    /// A single-area query reply (`typeId` 3, 5, 7).
    Area { kind: AreaStateKind, state: u8 },
    /// An all-areas reply (`typeId` 4, 6, 8), one value per area.
    AllAreas { kind: AreaStateKind, states: Vec<u8> },
    ZoneOmit { zone: u32, omitted: bool },
    Zone { zone: u32, condition: ZoneCondition },
    /// One byte per RIO, index 0 unused.
    ZoneBitmap { kind: ZoneBitmapKind, bitmap: Vec<u8> },
    /// One nibble per RIO.
    Outputs { states: Vec<u8> },
    Poll(PollReply),
    AuthorizationRequired { session: SessionId, user: Option<String> },
    AuthenticationAccepted,
    Unknown { type_id: i64, raw: Value },
}

#[derive(Deserialize)]
struct SiaFrame {
    sia: SiaMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AreaFrame {
    area_state: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllAreaFrame {
    area_state: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneOmitFrame {
    zone_number: u32,
    #[serde(deserialize_with = "lenient::flag")]
    omit_state: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneFrame {
    zone_number: u32,
    zone_state: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneBitmapFrame {
    zone_state: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputFrame {
    output_state: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationFrame {
    type_desc: SessionId,
    #[serde(default)]
    reply_text: Option<String>,
}

impl Envelope {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, ConsoleError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ConsoleError::InvalidFrame(format!("not JSON: {e}")))?;
        let type_id = value
            .get("typeId")
            .and_then(Value::as_i64)
            .ok_or_else(|| ConsoleError::InvalidFrame("missing integer typeId".to_owned()))?;
        let Some(tag) = TypeId::from_i64(type_id) else {
            return Ok(Self::Unknown { type_id, raw: value });
        };
        Self::from_tagged(tag, value)
            .map_err(|e| ConsoleError::InvalidFrame(format!("typeId {type_id}: {e}")))
    }

    fn from_tagged(tag: TypeId, value: Value) -> Result<Self, serde_json::Error> {
        use serde_json::from_value;

        let area = |kind, value| -> Result<Self, serde_json::Error> {
            let frame: AreaFrame = from_value(value)?;
            Ok(Self::Area { kind, state: frame.area_state })
        };
        let all_areas = |kind, value| -> Result<Self, serde_json::Error> {
            let frame: AllAreaFrame = from_value(value)?;
            Ok(Self::AllAreas { kind, states: frame.area_state })
        };
        let bitmap = |kind, value| -> Result<Self, serde_json::Error> {
            let frame: ZoneBitmapFrame = from_value(value)?;
            Ok(Self::ZoneBitmap { kind, bitmap: frame.zone_state })
        };

        Ok(match tag {
            TypeId::SiaMessage => Self::Sia(from_value::<SiaFrame>(value)?.sia),
            TypeId::StandardReply => Self::StandardReply(from_value(value)?),
            TypeId::HelpReply => Self::Help(from_value(value)?),
            TypeId::AreaArmedState => area(AreaStateKind::Armed, value)?,
            TypeId::AllAreaArmedState => all_areas(AreaStateKind::Armed, value)?,
            TypeId::AreaAlarmState => area(AreaStateKind::Alarm, value)?,
            TypeId::AllAreaAlarmState => all_areas(AreaStateKind::Alarm, value)?,
            TypeId::AreaReadyState => area(AreaStateKind::Ready, value)?,
            TypeId::AllAreaReadyState => all_areas(AreaStateKind::Ready, value)?,
            TypeId::ZoneOmitState => {
                let frame: ZoneOmitFrame = from_value(value)?;
                Self::ZoneOmit { zone: frame.zone_number, omitted: frame.omit_state }
            }
            TypeId::ZoneState => {
                let frame: ZoneFrame = from_value(value)?;
                let condition = ZoneCondition::from_code(frame.zone_state).ok_or_else(|| {
                    <serde_json::Error as serde::de::Error>::custom(format!(
                        "zoneState {} out of range",
                        frame.zone_state
                    ))
                })?;
                Self::Zone { zone: frame.zone_number, condition }
            }
            TypeId::AllZoneReadyState => bitmap(ZoneBitmapKind::Ready, value)?,
            TypeId::AllZoneAlarmState => bitmap(ZoneBitmapKind::Alarm, value)?,
            TypeId::AllZoneOpenState => bitmap(ZoneBitmapKind::Open, value)?,
            TypeId::AllZoneTamperState => bitmap(ZoneBitmapKind::Tamper, value)?,
            TypeId::AllZoneRState => bitmap(ZoneBitmapKind::Resistance, value)?,
            TypeId::AllZoneOmitState => bitmap(ZoneBitmapKind::Omit, value)?,
            TypeId::AllOutputState => {
                Self::Outputs { states: from_value::<OutputFrame>(value)?.output_state }
            }
            TypeId::PollReply => Self::Poll(from_value(value)?),
            TypeId::AuthorizationRequired => {
                let frame: AuthorizationFrame = from_value(value)?;
                let user = frame.reply_text.filter(|s| !s.is_empty());
                Self::AuthorizationRequired { session: frame.type_desc, user }
            }
            TypeId::AuthenticationAccepted => Self::AuthenticationAccepted,
        })
    }

    /// The discriminant this envelope was decoded from.
    pub fn type_id(&self) -> i64 {
        let tag = match self {
            Self::Sia(_) => TypeId::SiaMessage,
            Self::StandardReply(_) => TypeId::StandardReply,
            Self::Help(_) => TypeId::HelpReply,
            Self::Area { kind: AreaStateKind::Armed, .. } => TypeId::AreaArmedState,
            Self::Area { kind: AreaStateKind::Alarm, .. } => TypeId::AreaAlarmState,
            Self::Area { kind: AreaStateKind::Ready, .. } => TypeId::AreaReadyState,
            Self::AllAreas { kind: AreaStateKind::Armed, .. } => TypeId::AllAreaArmedState,
            Self::AllAreas { kind: AreaStateKind::Alarm, .. } => TypeId::AllAreaAlarmState,
            Self::AllAreas { kind: AreaStateKind::Ready, .. } => TypeId::AllAreaReadyState,
            Self::ZoneOmit { .. } => TypeId::ZoneOmitState,
            Self::Zone { .. } => TypeId::ZoneState,
            Self::ZoneBitmap { kind, .. } => {
                const BITMAPS: [TypeId; 6] = [
                    TypeId::AllZoneReadyState,
                    TypeId::AllZoneAlarmState,
                    TypeId::AllZoneOpenState,
                    TypeId::AllZoneTamperState,
                    TypeId::AllZoneRState,
                    TypeId::AllZoneOmitState,
                ];
                BITMAPS[kind.index()]
            }
            Self::Outputs { .. } => TypeId::AllOutputState,
            Self::Poll(_) => TypeId::PollReply,
            Self::AuthorizationRequired { .. } => TypeId::AuthorizationRequired,
            Self::AuthenticationAccepted => TypeId::AuthenticationAccepted,
            Self::Unknown { type_id, .. } => return *type_id,
        };
        tag.code()
    }
}

/// Deserializers for the loosely typed values PHP and the C++ server emit.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept `true`/`false` or a number (non-zero is true).
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(s) => Ok(!matches!(s.trim(), "" | "0" | "false")),
            Value::Null => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected flag, got {other}"))),
        }
    }

    /// Accept a string or a number as text; `null` is absent.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(serde::de::Error::custom(format!("expected text, got {other}"))),
        }
    }

    /// Accept an integer given as a number or a numeric string.
    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| serde::de::Error::custom(format!("expected integer, got {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("expected integer, got {s:?}"))),
            other => Err(serde::de::Error::custom(format!("expected integer, got {other}"))),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

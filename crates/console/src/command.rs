// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Panel command strings and the operator's `/` shorthand for them.
//!
//! Anything the operator types without a leading `/` goes to the server
//! verbatim. Lines starting with `/` are expanded here into one or more
//! server commands (or a console-local action).

use std::fmt;

use crate::address::{OutputAddress, RioAddress, ZoneAddress};
use crate::protocol::{AreaStateKind, ZoneBitmapKind};

/// Highest area number; area 0 addresses all areas.
pub const MAX_AREA: u8 = 32;

pub const OUTPUT_GETALL: &str = "OUTPUT GETALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaAction {
    Set,
    Unset,
    Partial,
    Reset,
    Abort,
    Force,
    Query(AreaStateKind),
}

impl AreaAction {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Unset => "UNSET",
            Self::Partial => "PARTIAL",
            Self::Reset => "RESET",
            Self::Abort => "ABORT",
            Self::Force => "FORCE",
            Self::Query(kind) => kind.keyword(),
        }
    }

    fn parse(word: &str) -> anyhow::Result<Self> {
        Ok(match word.to_ascii_uppercase().as_str() {
            "SET" => Self::Set,
            "UNSET" => Self::Unset,
            "PARTIAL" => Self::Partial,
            "RESET" => Self::Reset,
            "ABORT" => Self::Abort,
            "FORCE" => Self::Force,
            other => Self::Query(area_query(other)?),
        })
    }
}

fn area_query(word: &str) -> anyhow::Result<AreaStateKind> {
    Ok(match word.to_ascii_uppercase().as_str() {
        "STATE" => AreaStateKind::Armed,
        "ALARM" => AreaStateKind::Alarm,
        "READY" => AreaStateKind::Ready,
        other => anyhow::bail!("unknown area action {other:?}"),
    })
}

fn zone_query(word: &str) -> anyhow::Result<ZoneBitmapKind> {
    let upper = word.to_ascii_uppercase();
    ZoneBitmapKind::ALL
        .into_iter()
        .find(|kind| kind.keyword() == upper)
        .ok_or_else(|| anyhow::anyhow!("unknown zone state {word:?}"))
}

/// `AREA <n> <ACTION>`; area 0 is all areas.
pub fn area(area: u8, action: AreaAction) -> String {
    format!("AREA {area} {}", action.keyword())
}

pub fn zone_state(zone: ZoneAddress) -> String {
    format!("ZONE {zone} STATE")
}

/// `ZONE <n> OMIT|UNOMIT` for every zone from `start` to `end`.
pub fn omit(start: ZoneAddress, end: ZoneAddress, omit: bool) -> Vec<String> {
    let action = if omit { "OMIT" } else { "UNOMIT" };
    ZoneAddress::range(start, end).map(|zone| format!("ZONE {zone} {action}")).collect()
}

pub fn zones(kind: ZoneBitmapKind) -> String {
    format!("ZONES {}", kind.keyword())
}

/// `OUTPUT <n> ON|OFF` for every output from `start` to `end`.
pub fn outputs(start: OutputAddress, end: OutputAddress, on: bool) -> Vec<String> {
    let action = if on { "ON" } else { "OFF" };
    OutputAddress::range(start, end).map(|output| format!("OUTPUT {output} {action}")).collect()
}

/// `AREA <n> <ACTION>` once per listed area, in the order given.
pub fn areas(list: &[u8], action: AreaAction) -> Vec<String> {
    list.iter().map(|n| area(*n, action)).collect()
}

/// A zone or output type, by number (1-99) or by the panel's name for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName(String);

impl TypeName {
    pub fn parse(word: &str) -> anyhow::Result<Self> {
        let word = word.trim();
        if let Ok(n) = word.parse::<u32>() {
            if !(1..=99).contains(&n) {
                anyhow::bail!("type number {n} out of range (1-99)");
            }
            return Ok(Self(n.to_string()));
        }
        let valid = !word.is_empty()
            && word.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/'));
        if !valid {
            anyhow::bail!("invalid type {word:?}");
        }
        Ok(Self(word.to_ascii_uppercase()))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a zone command applies to: one zone, or every zone of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneTarget {
    Zone(ZoneAddress),
    Type(TypeName),
}

impl ZoneTarget {
    /// Numbers from 1000 up are zones, anything else is a type.
    pub fn parse(word: &str) -> anyhow::Result<Self> {
        match word.trim().parse::<u32>() {
            Ok(n) if n >= 1000 => Ok(Self::Zone(ZoneAddress::parse(word)?)),
            _ => Ok(Self::Type(TypeName::parse(word)?)),
        }
    }
}

impl fmt::Display for ZoneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zone(zone) => write!(f, "{zone}"),
            Self::Type(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneParameter {
    SoakTest,
    PartSet,
}

impl ZoneParameter {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::SoakTest => "SOAK-TEST",
            Self::PartSet => "PART-SET",
        }
    }

    fn parse(word: &str) -> anyhow::Result<Self> {
        Ok(match word.to_ascii_uppercase().as_str() {
            "SOAK-TEST" => Self::SoakTest,
            "PART-SET" => Self::PartSet,
            other => anyhow::bail!("unknown zone parameter {other:?}"),
        })
    }
}

/// State a zone is programmed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSetState {
    Open,
    Closed,
    OpenClose,
    Tamper,
}

impl ZoneSetState {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::OpenClose => "OPEN-CLOSE",
            Self::Tamper => "TAMPER",
        }
    }

    fn parse(word: &str) -> anyhow::Result<Self> {
        Ok(match word.to_ascii_uppercase().as_str() {
            "OPEN" => Self::Open,
            "CLOSED" => Self::Closed,
            "OPEN-CLOSE" => Self::OpenClose,
            "TAMPER" => Self::Tamper,
            other => anyhow::bail!("unknown zone state {other:?}"),
        })
    }
}

/// Everything `ZONE <n> SET` programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneProgram {
    pub state: ZoneSetState,
    /// 1-32.
    pub area: u8,
    pub kind: TypeName,
    pub description: Option<String>,
}

/// `ZONE <n|type> PARAMETER <option> ON|OFF`.
pub fn zone_parameter(target: &ZoneTarget, parameter: ZoneParameter, on: bool) -> String {
    format!("ZONE {target} PARAMETER {} {}", parameter.keyword(), on_off(on))
}

/// `ZONE <n> SET <state> <area> <type> [description]`.
pub fn zone_program(zone: ZoneAddress, program: &ZoneProgram) -> String {
    let mut cmd = format!(
        "ZONE {zone} SET {} {} {}",
        program.state.keyword(),
        program.area,
        program.kind
    );
    if let Some(desc) = program.description.as_deref().filter(|d| !d.is_empty()) {
        cmd.push(' ');
        cmd.push_str(desc);
    }
    cmd
}

/// `ZONE <type> OMIT|UNOMIT`: every zone of a type at once.
pub fn omit_type(kind: &TypeName, omit: bool) -> String {
    format!("ZONE {kind} {}", if omit { "OMIT" } else { "UNOMIT" })
}

/// `OUTPUT <type> ON|OFF <area>`: every output of a type in one area.
pub fn output_type(kind: &TypeName, area: u8, on: bool) -> String {
    format!("OUTPUT {kind} {} {area}", on_off(on))
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

fn parse_on_off(word: &str) -> anyhow::Result<bool> {
    match word.to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        other => anyhow::bail!("expected on or off, got {other:?}"),
    }
}

fn parse_area(word: &str, min: u8) -> anyhow::Result<u8> {
    let n: u8 = word.parse().map_err(|_| anyhow::anyhow!("invalid area {word:?}"))?;
    if !(min..=MAX_AREA).contains(&n) {
        anyhow::bail!("area {n} out of range ({min}-{MAX_AREA})");
    }
    Ok(n)
}

/// Items the server can include in its poll replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollItem {
    Areas,
    Zones,
    Outputs,
    All,
}

impl fmt::Display for PollItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Areas => "AREAS",
            Self::Zones => "ZONES",
            Self::Outputs => "OUTPUTS",
            Self::All => "ALL",
        })
    }
}

impl PollItem {
    fn parse(word: &str) -> anyhow::Result<Self> {
        Ok(match word.to_ascii_uppercase().as_str() {
            "AREAS" => Self::Areas,
            "ZONES" => Self::Zones,
            "OUTPUTS" => Self::Outputs,
            "ALL" => Self::All,
            other => anyhow::bail!("unknown poll item {other:?}"),
        })
    }
}

/// What an operator line asks the console to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Send these commands in order. `focus` narrows how bulk replies are shown.
    Send { commands: Vec<String>, focus: Option<RioAddress> },
    Login,
    Help,
    Quit,
}

impl Directive {
    fn send(command: String) -> Self {
        Self::many(vec![command])
    }

    fn many(commands: Vec<String>) -> Self {
        Self::Send { commands, focus: None }
    }

    /// Interpret one operator line.
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::send(line.to_owned()));
        };
        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        match (name.as_str(), args.as_slice()) {
            ("quit" | "exit", []) => Ok(Self::Quit),
            ("help", []) => Ok(Self::Help),
            ("login", []) => Ok(Self::Login),
            ("areas", [query]) => Ok(Self::send(area(0, AreaAction::Query(area_query(query)?)))),
            ("area", [list, action]) => {
                let list = list
                    .split(',')
                    .map(|n| parse_area(n.trim(), 0))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Ok(Self::many(areas(&list, AreaAction::parse(action)?)))
            }
            ("zone", [n]) => Ok(Self::send(zone_state(ZoneAddress::parse(n)?))),
            ("zone", [target, "param", parameter, state]) => Ok(Self::send(zone_parameter(
                &ZoneTarget::parse(target)?,
                ZoneParameter::parse(parameter)?,
                parse_on_off(state)?,
            ))),
            ("zone", [n, "program", state, area, kind, description @ ..]) => {
                let program = ZoneProgram {
                    state: ZoneSetState::parse(state)?,
                    area: parse_area(area, 1)?,
                    kind: TypeName::parse(kind)?,
                    description: (!description.is_empty()).then(|| description.join(" ")),
                };
                Ok(Self::send(zone_program(ZoneAddress::parse(n)?, &program)))
            }
            (verb @ ("omit" | "unomit"), ["type", kind]) => {
                Ok(Self::send(omit_type(&TypeName::parse(kind)?, verb == "omit")))
            }
            ("output", ["type", kind, area, state]) => Ok(Self::send(output_type(
                &TypeName::parse(kind)?,
                parse_area(area, 1)?,
                parse_on_off(state)?,
            ))),
            ("zones", [kind, rest @ ..]) if rest.len() <= 1 => {
                let focus = rest.first().map(|rio| RioAddress::parse(rio)).transpose()?;
                Ok(Self::Send { commands: vec![zones(zone_query(kind)?)], focus })
            }
            (verb @ ("omit" | "unomit"), [start, rest @ ..]) if rest.len() <= 1 => {
                let start = ZoneAddress::parse(start)?;
                let end = rest.first().map(|end| ZoneAddress::parse(end)).transpose()?;
                Ok(Self::Send {
                    commands: omit(start, end.unwrap_or(start), verb == "omit"),
                    focus: None,
                })
            }
            ("output", [start, range @ .., state]) if range.len() <= 1 => {
                let on = parse_on_off(state)?;
                let start = OutputAddress::parse(start)?;
                let end = range.first().map(|end| OutputAddress::parse(end)).transpose()?;
                Ok(Self::Send { commands: outputs(start, end.unwrap_or(start), on), focus: None })
            }
            ("outputs", rest) if rest.len() <= 1 => {
                let focus = rest.first().map(|rio| RioAddress::parse(rio)).transpose()?;
                Ok(Self::Send { commands: vec![OUTPUT_GETALL.to_owned()], focus })
            }
            ("poll", ["on", seconds]) => {
                let seconds: u32 =
                    seconds.parse().map_err(|_| anyhow::anyhow!("invalid interval {seconds:?}"))?;
                Ok(Self::send(format!("POLL ON {seconds}")))
            }
            ("poll", ["off"]) => Ok(Self::send("POLL OFF".to_owned())),
            ("poll", ["once"]) => Ok(Self::send("POLL ONCE".to_owned())),
            ("poll", [verb @ ("add" | "remove"), item]) => {
                let item = PollItem::parse(item)?;
                Ok(Self::send(format!("POLL {} {item}", verb.to_ascii_uppercase())))
            }
            _ => anyhow::bail!("unknown directive {line:?} (try /help)"),
        }
    }
}

/// Shown for `/help`. The server's own `HELP` command covers the raw syntax.
pub const DIRECTIVE_HELP: &str = "\
console directives:
  /areas state|alarm|ready          query all areas
  /area <n[,n...]> <action>         set unset partial reset abort force state alarm ready
  /zone <zone>                      query one zone
  /zone <zone|type> param soak-test|part-set on|off
  /zone <zone> program <state> <area> <type> [description]
                                    state: open closed open-close tamper
  /zones <state> [rio]              ready alarm open tamper rstate omitted
  /omit <zone> [zone]               omit a zone or range
  /unomit <zone> [zone]             unomit a zone or range
  /omit|/unomit type <type>         every zone of a type
  /output <out> [out] on|off        switch an output or range
  /output type <type> <area> on|off every output of a type in an area
  /outputs [rio]                    query all outputs
  /poll on <secs>|off|once          server-side polling
  /poll add|remove <item>           areas zones outputs all
  /login                            enter credentials
  /quit                             leave the console
anything else is sent to the server as typed (try HELP)";

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes each decoded envelope to exactly one handler.

use tracing::{debug, warn};

use crate::address::{RioAddress, ZoneAddress};
use crate::protocol::Envelope;
use crate::error::ConsoleError;
use crate::session::SessionGate;
use crate::state::PanelState;
use crate::status::{StatusIndicator, Tone};
use crate::view::{Notice, View};

/// What the console loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The server wants credentials for the current session.
    Login,
    /// The server restarted under a different session; this console
    /// instance is finished and must be rebuilt.
    Reload,
}

pub struct Dispatcher<V> {
    gate: SessionGate,
    panel: PanelState,
    status: StatusIndicator,
    view: V,
    focus: Option<RioAddress>,
    finished: bool,
}

impl<V: View> Dispatcher<V> {
    pub fn new(status: StatusIndicator, view: V) -> Self {
        Self {
            gate: SessionGate::new(),
            panel: PanelState::new(),
            status,
            view,
            focus: None,
            finished: false,
        }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Limit bulk zone/output replies to one RIO, or show them all.
    pub fn set_focus(&mut self, focus: Option<RioAddress>) {
        self.focus = focus;
    }

    /// Show something that did not come from the socket.
    pub fn notify(&mut self, notice: Notice) {
        self.view.show(notice);
    }

    /// Decode and handle one text frame. Undecodable frames are logged and skipped.
    pub fn handle_frame(&mut self, text: &str) -> Flow {
        match Envelope::parse(text) {
            Ok(envelope) => self.handle(envelope),
            Err(e) => {
                warn!(err = %e, "dropping frame");
                if self.finished {
                    Flow::Reload
                } else {
                    Flow::Continue
                }
            }
        }
    }

    pub fn handle(&mut self, envelope: Envelope) -> Flow {
        if self.finished {
            debug!(type_id = envelope.type_id(), "ignoring frame after reload");
            return Flow::Reload;
        }

        match envelope {
            Envelope::Sia(sia) => self.view.show(Notice::Sia(sia)),
            Envelope::StandardReply(reply) => {
                if reply.success {
                    self.succeeded(&reply.command);
                } else {
                    self.status.flash(format!("{} (error)", reply.command), Tone::Error);
                    self.view.show(Notice::CommandFailed {
                        command: reply.command,
                        reply: reply.reply_text,
                    });
                }
            }
            Envelope::Help(help) => {
                self.succeeded(&help.command);
                self.view.show(Notice::Help(help.help_text));
            }
            Envelope::Area { kind, state } => {
                self.succeeded(&format!("AREA {}", kind.keyword()));
                self.view.show(Notice::Area { kind, state });
            }
            Envelope::AllAreas { kind, states } => {
                self.panel.record_areas(kind, &states);
                self.succeeded(&format!("AREA 0 {}", kind.keyword()));
                let states = self.panel.areas(kind).to_vec();
                self.view.show(Notice::Areas { kind, states });
            }
            Envelope::ZoneOmit { zone, omitted } => {
                let zone = ZoneAddress::decode(zone);
                self.panel.record_omit(zone, omitted);
                self.succeeded(&format!("ZONE {zone} STATE"));
                self.view.show(Notice::ZoneOmit { zone, omitted });
            }
            Envelope::Zone { zone, condition } => {
                let zone = ZoneAddress::decode(zone);
                self.panel.record_zone(zone, condition);
                self.succeeded(&format!("ZONE {zone} STATE"));
                self.view.show(Notice::Zone { zone, condition });
            }
            Envelope::ZoneBitmap { kind, bitmap } => {
                self.panel.record_bitmap(kind, &bitmap);
                self.succeeded(&format!("ZONES {}", kind.keyword()));
                let zones = self.panel.zones_set(kind, self.focus);
                self.view.show(Notice::ZoneBitmap { kind, rio: self.focus, zones });
            }
            Envelope::Outputs { states } => {
                self.panel.record_outputs(&states);
                self.succeeded(crate::command::OUTPUT_GETALL);
                let on = self.panel.outputs_on(self.focus);
                self.view.show(Notice::Outputs { rio: self.focus, on });
            }
            Envelope::Poll(poll) => {
                let was = self.panel.online;
                self.panel.apply_poll(&poll);
                if was != Some(poll.panel_is_online) {
                    self.view.show(Notice::PanelOnline(poll.panel_is_online));
                }
            }
            Envelope::AuthorizationRequired { session, user } => {
                return match self.gate.check(session) {
                    Ok(()) => {
                        self.status.flash("Login required!", Tone::Notice);
                        self.view.show(Notice::LoginRequired { user });
                        Flow::Login
                    }
                    Err(e) => self.gate_failed(e),
                };
            }
            Envelope::AuthenticationAccepted => {
                self.gate.on_authentication_accepted();
                self.status.flash("Login successful!", Tone::Active);
                self.view.show(Notice::LoginAccepted);
            }
            Envelope::Unknown { type_id, raw } => {
                debug!(type_id, "unhandled envelope");
                self.view.show(Notice::Unknown { type_id, raw: raw.to_string() });
            }
        }
        Flow::Continue
    }

    /// A fatal gate error finishes this instance; anything else is shown.
    fn gate_failed(&mut self, err: ConsoleError) -> Flow {
        if !err.is_fatal() {
            self.view.show(Notice::Error(err.to_string()));
            return Flow::Continue;
        }
        self.finished = true;
        if let ConsoleError::SessionMismatch { local, remote } = err {
            self.view.show(Notice::SessionChanged { local, remote });
        }
        Flow::Reload
    }

    fn succeeded(&self, command: &str) {
        self.status.flash(format!("{command} (success)"), Tone::Active);
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

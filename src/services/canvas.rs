//! Canvas log: ordered record of the drawer's operations.
//!
//! DESIGN
//! ======
//! Every drawing op from the current drawer is appended before it is relayed
//! to the other participants. The log exists for two reasons: replaying the
//! canvas to late joiners, and undo-by-replay (truncate, broadcast `clear`,
//! re-send what is left so every canvas matches the server's copy).
//!
//! A replay always travels as one `canvasReplay {ops: [{event, data}, ...]}`
//! frame. Outbound channels are bounded and drop on overflow, so a log of any
//! length must cost exactly one slot per recipient.
//!
//! Undo removes two complete operations per invocation. A complete operation
//! ends at the nearest `startPath`, `dot`, or `fill` when scanning backward.

use tracing::debug;

use crate::frame::{Data, EV_CANVAS_REPLAY, EV_CLEAR, EV_DOT, EV_DRAW, EV_END_PATH, EV_FILL, EV_START_PATH, Frame};
use crate::services::session::{ClientId, GameError, Session};

/// Operations popped per undo request.
const UNDO_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    StartPath,
    Draw,
    Dot,
    Fill,
}

impl DrawKind {
    #[must_use]
    pub fn from_event(event: &str) -> Option<Self> {
        match event {
            EV_START_PATH => Some(Self::StartPath),
            EV_DRAW => Some(Self::Draw),
            EV_DOT => Some(Self::Dot),
            EV_FILL => Some(Self::Fill),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_event(self) -> &'static str {
        match self {
            Self::StartPath => EV_START_PATH,
            Self::Draw => EV_DRAW,
            Self::Dot => EV_DOT,
            Self::Fill => EV_FILL,
        }
    }

    /// True for kinds that open a complete operation.
    #[must_use]
    pub fn starts_operation(self) -> bool {
        !matches!(self, Self::Draw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasOp {
    pub kind: DrawKind,
    pub payload: Data,
}

impl CanvasOp {
    /// `{event, data}` entry inside a replay frame.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "event": self.kind.as_event(), "data": self.payload })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasLog {
    ops: Vec<CanvasOp>,
}

impl CanvasLog {
    pub fn append(&mut self, kind: DrawKind, payload: Data) {
        self.ops.push(CanvasOp { kind, payload });
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    #[must_use]
    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Pop entries back to and including the most recent operation start.
    /// Returns false if the log was already empty.
    pub fn pop_operation(&mut self) -> bool {
        if self.ops.is_empty() {
            return false;
        }
        while let Some(op) = self.ops.pop() {
            if op.kind.starts_operation() {
                break;
            }
        }
        true
    }

    /// Single frame that rebuilds the canvas from scratch.
    #[must_use]
    pub fn replay_frame(&self) -> Frame {
        let ops: Vec<serde_json::Value> = self.ops().iter().map(CanvasOp::to_json).collect();
        Frame::empty(EV_CANVAS_REPLAY).with_data("ops", ops)
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn require_drawer(session: &Session, client: ClientId, action: &'static str) -> Result<(), GameError> {
    if session.is_drawer(client) { Ok(()) } else { Err(GameError::NotDrawer(action)) }
}

/// Log a drawing op from the drawer and relay it to everyone else.
///
/// # Errors
///
/// Returns `GameError::NotDrawer` if the sender is not drawing.
pub fn draw(session: &mut Session, client: ClientId, kind: DrawKind, payload: Data) -> Result<(), GameError> {
    require_drawer(session, client, "draw")?;
    session.canvas.append(kind, payload.clone());
    session.broadcast_except(Some(client), &Frame::new(kind.as_event(), payload));
    Ok(())
}

/// Relay the end of a stroke. Not logged.
///
/// # Errors
///
/// Returns `GameError::NotDrawer` if the sender is not drawing.
pub fn end_path(session: &Session, client: ClientId) -> Result<(), GameError> {
    require_drawer(session, client, "draw")?;
    session.broadcast_except(Some(client), &Frame::empty(EV_END_PATH));
    Ok(())
}

/// Wipe the log and everyone else's canvas.
///
/// # Errors
///
/// Returns `GameError::NotDrawer` if the sender is not drawing.
pub fn clear(session: &mut Session, client: ClientId) -> Result<(), GameError> {
    require_drawer(session, client, "clear")?;
    session.canvas.clear();
    session.broadcast_except(Some(client), &Frame::empty(EV_CLEAR));
    Ok(())
}

/// Drop the last two operations, then clear and replay on every client.
///
/// # Errors
///
/// Returns an error if the sender is not drawing or the log is empty.
pub fn undo(session: &mut Session, client: ClientId) -> Result<(), GameError> {
    require_drawer(session, client, "undo")?;
    if session.canvas.is_empty() {
        return Err(GameError::EmptyHistory);
    }

    for _ in 0..UNDO_DEPTH {
        session.canvas.pop_operation();
    }
    debug!(room = %session.room, remaining = session.canvas.len(), "canvas undo");

    session.broadcast_all(&Frame::empty(EV_CLEAR));
    session.broadcast_all(&session.canvas.replay_frame());
    Ok(())
}

/// Bring one connection's canvas up to date. Nothing is sent for a blank
/// canvas.
pub fn replay_to(session: &Session, client: ClientId) {
    if session.canvas.is_empty() {
        return;
    }
    session.send_to(client, session.canvas.replay_frame());
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;

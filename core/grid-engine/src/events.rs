//! FILENAME: core/grid-engine/src/events.rs
//! Grid Events - Synchronous notifications to subscribed listeners.
//!
//! Events are delivered in subscription order, once per interaction, before
//! the triggering call returns. Payloads borrow from the grid, so listeners
//! copy out whatever they want to keep.

use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::column::ColumnDef;
use crate::flatten::TreeRow;
use crate::row::RowId;
use crate::service::GridService;
use crate::value::FieldValue;

// ============================================================================
// POINTER INPUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

/// The originating pointer interaction, passed through to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Position relative to the grid viewport, in pixels.
    pub x: f64,
    pub y: f64,

    #[serde(default)]
    pub button: MouseButton,

    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        PointerEvent {
            x,
            y,
            ..Default::default()
        }
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// Everything a grid can emit.
pub enum GridEvent<'a, T> {
    RowClicked {
        row: &'a TreeRow,
        /// The record behind a leaf; `None` for group rows.
        data: Option<&'a T>,
        event: PointerEvent,
    },
    CellClicked {
        row: &'a TreeRow,
        data: Option<&'a T>,
        column: &'a ColumnDef<T>,
        value: FieldValue,
        event: PointerEvent,
    },
    GroupToggled {
        group_id: &'a RowId,
        /// The group's row, when it is visible after the toggle.
        row: Option<&'a TreeRow>,
        expanded: bool,
    },
    Ready {
        api: &'a GridService<T>,
    },
}

impl<T> GridEvent<'_, T> {
    pub fn name(&self) -> &'static str {
        match self {
            GridEvent::RowClicked { .. } => "rowClicked",
            GridEvent::CellClicked { .. } => "cellClicked",
            GridEvent::GroupToggled { .. } => "groupToggled",
            GridEvent::Ready { .. } => "ready",
        }
    }
}

impl<T> fmt::Debug for GridEvent<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridEvent::RowClicked { row, event, .. } => f
                .debug_struct("RowClicked")
                .field("row", &row.id())
                .field("event", event)
                .finish(),
            GridEvent::CellClicked {
                row,
                column,
                value,
                event,
                ..
            } => f
                .debug_struct("CellClicked")
                .field("row", &row.id())
                .field("column", &column.field)
                .field("value", value)
                .field("event", event)
                .finish(),
            GridEvent::GroupToggled {
                group_id, expanded, ..
            } => f
                .debug_struct("GroupToggled")
                .field("group_id", group_id)
                .field("expanded", expanded)
                .finish(),
            GridEvent::Ready { .. } => f.write_str("Ready"),
        }
    }
}

// ============================================================================
// LISTENER REGISTRY
// ============================================================================

pub type EventListener<T> = Box<dyn Fn(&GridEvent<'_, T>) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

pub struct EventBus<T> {
    listeners: Vec<(ListenerId, EventListener<T>)>,
    next_id: u64,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        EventBus {
            listeners: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: EventListener<T>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false when the handle is unknown (already removed).
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &GridEvent<'_, T>) {
        trace!("emit {} to {} listeners", event.name(), self.listeners.len());
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

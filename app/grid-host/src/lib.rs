//! FILENAME: app/grid-host/src/lib.rs
// PURPOSE: Headless host bridging the grid engine to a virtualized renderer.
// CONTEXT: Grids live behind mutex-guarded state; commands take the state,
// lock it for one operation and return serializable responses. Engine events
// are copied into a per-grid channel the renderer drains.

use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use grid_engine::{GridId, GridService};
use rustc_hash::FxHashMap;
use serde_json::Value;

pub mod api_types;
pub mod commands;
pub mod logging;

pub use api_types::{
    CellData, ColumnData, ColumnSpec, CreateGridRequest, GridEventData, GridInfoResponse,
    RowData, RowWindowRequest, RowWindowResponse,
};
pub use commands::*;
pub use logging::{close_log_file, get_log_path, init_log_file, next_seq, write_log};

/// Grid instances hosted for the renderer hold JSON records.
pub type HostGrid = GridService<Value>;

// ============================================================================
// HOST STATE
// ============================================================================

pub struct HostState {
    pub grids: Mutex<FxHashMap<GridId, HostGrid>>,
    pub next_grid_id: Mutex<GridId>,
    /// Receiving end of each grid's event channel.
    pub event_receivers: Mutex<FxHashMap<GridId, Receiver<GridEventData>>>,
}

pub fn create_host_state() -> HostState {
    log_info!("SYS", "Creating HostState");
    HostState {
        grids: Mutex::new(FxHashMap::default()),
        next_grid_id: Mutex::new(1),
        event_receivers: Mutex::new(FxHashMap::default()),
    }
}

impl Default for HostState {
    fn default() -> Self {
        create_host_state()
    }
}

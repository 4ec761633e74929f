//! FILENAME: core/grid-engine/src/lib.rs
//! Grouped row pipeline for virtualized grids.
//!
//! This crate turns a flat, caller-owned row collection plus its grouping
//! configuration into the addressable sequence of visible rows (groups and
//! leaves interleaved by expand/collapse state) that a windowing renderer
//! indexes by position.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the grid IS)
//! - `stage`, `tree`, `flatten`: The pipeline steps (HOW rows are derived)
//! - `view`: Published snapshot with windowed access (WHAT we display)
//! - `engine`: One pure rebuild from configuration to view
//! - `service`: The stateful grid api with events

pub mod column;
pub mod definition;
pub mod engine;
pub mod error;
pub mod events;
pub mod expansion;
pub mod flatten;
pub mod record;
pub mod row;
pub mod service;
pub mod stage;
pub mod tree;
pub mod value;
pub mod view;

pub use column::{CellClass, CellRenderer, ColumnDef, ValueFormatter, ValueGetter, DEFAULT_COLUMN_WIDTH};
pub use definition::*;
pub use engine::{calculate_view, ViewCalculator};
pub use error::{GridError, GridResult};
pub use events::{
    EventBus, EventListener, GridEvent, ListenerId, Modifiers, MouseButton, PointerEvent,
};
pub use expansion::ExpansionState;
pub use flatten::{flatten, TreeRow};
pub use record::GridRecord;
pub use row::{GroupNode, GroupPath, LeafRow, RowId, RowNode, GROUP_ID_ROOT, LEAF_ID_PREFIX};
pub use service::GridService;
pub use stage::{filter_and_sort, filter_indices, passes_filters, sort_indices};
pub use tree::{build_tree, Tree, TreeEntry};
pub use value::{FieldValue, OrderedFloat, NULL_GROUP_KEY};
pub use view::{GridView, VisibleRange};

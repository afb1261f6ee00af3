//! Declarative binding of view-model components to a native list widget
//!
//! Applications describe the whole list as [`Section`]s of [`Block`]s on every
//! change. The [`Renderer`] diffs each new description against the current one and
//! drives the widget with minimal, correctly ordered mutation batches. Flexible
//! elements share the viewport space left blank by the rest of the content.
#[macro_use]
mod errors;

pub mod component;
pub mod config;
pub mod converters;
pub mod diff_engine;
pub mod drag_drop;
pub mod flexible_height;
pub mod registry;
pub mod renderer;
pub mod scheduler;
pub mod section;
pub mod spacer;
pub mod types;

pub use component::{into_blocks, Block, Component, Deselect, IntoBlock};
pub use config::RendererConfig;
pub use diff_engine::diff;
pub use drag_drop::{DragHooks, DragItem, DragPreviewMask, DropProposal};
pub use errors::BlocksError;
pub use registry::{ComponentView, DequeuedView, EmptyView, ViewRegistry, ViewSource};
pub use renderer::{ListWidget, Renderer, RendererDelegate};
pub use section::Section;
pub use spacer::{Spacer, SpacerKind};
pub use types::{AnimationStyle, Dimension, EditScript, ElementSlot, Identity, MutationBatch, Position, Viewport};

//! Drag-to-reorder of rows
//!
//! A drag session remembers its source by identity, not by index, so a drop is
//! always applied to the list current at drop time. A drop is two updates: the
//! source row is removed right away, and the row is inserted at its destination
//! on the next idle turn.
use crate::component::Block;
use crate::config::RendererConfig;
use crate::errors::BlocksError;
use crate::section::{find_row, Section};
use crate::types::{Identity, IdentityScope, Position, Rect};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application policy for drag and drop. Every hook has a permissive default.
pub trait DragHooks {
    fn can_drag(&self, _position: Position, _block: &Block) -> bool {
        true
    }

    /// Asked when a drop is proposed, performed and completed, each time with the
    /// list current at that moment.
    fn can_drop(&self, _source: Position, _destination: Position, _sections: &[Section]) -> bool {
        true
    }

    fn drag_started(&mut self) {}

    /// Called once the dropped row is in place. `destination` is its final position.
    fn drop_completed(&mut self, _source: Position, _destination: Position, _sections: &[Section]) {}

    /// Replaces the default preview mask for one row.
    fn customize_drag_preview(&self, _block: &Block) -> Option<DragPreviewMask> {
        None
    }
}

#[derive(Debug, Default)]
pub struct DefaultDragHooks;

impl DragHooks for DefaultDragHooks {}

/// Insets and corner radius of the visible part of a drag preview.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragPreviewMask {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub corner_radius: f64,
}

impl Default for DragPreviewMask {
    fn default() -> Self {
        DragPreviewMask {
            top: 2.0,
            right: 20.0,
            bottom: 2.0,
            left: 20.0,
            corner_radius: 5.0,
        }
    }
}

impl DragPreviewMask {
    pub fn apply(&self, frame: Rect) -> PreviewPath {
        PreviewPath {
            rect: Rect::new(
                frame.x + self.left,
                frame.y + self.top,
                (frame.width - self.left - self.right).max(0.0),
                (frame.height - self.top - self.bottom).max(0.0),
            ),
            corner_radius: self.corner_radius,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), BlocksError> {
        let values = [self.top, self.right, self.bottom, self.left, self.corner_radius];
        if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
            Ok(())
        } else {
            Err(BlocksError::InvalidConfig {
                details: format!("drag preview insets must be non-negative, got {:?}", self),
            })
        }
    }
}

/// Rounded rectangle the widget shows as the drag preview.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PreviewPath {
    pub rect: Rect,
    pub corner_radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropProposal {
    Cancel,
    Move,
}

/// Payload handed to the widget when a drag begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragItem {
    pub session: Uuid,
    pub identity: Identity,
}

#[derive(Clone, Debug)]
struct DragSession {
    id: Uuid,
    section: Identity,
    row: Identity,
}

/// Insert half of a drop, waiting for the next idle turn.
#[derive(Clone, Debug)]
pub struct PendingDrop {
    pub session: Uuid,
    pub block: Block,
    /// Position of the row when the drop was performed.
    pub source: Position,
    pub source_section: Identity,
    pub destination_section: Identity,
    pub destination_row: usize,
}

impl PendingDrop {
    /// The list with the row inserted, and the row's final position.
    ///
    /// The destination is resolved again against `sections`: the row index is
    /// clamped, and a destination section that disappeared falls back to the source
    /// section. `None` when neither section exists any more, or when the landing
    /// section already holds a row with the same identity.
    pub fn insert_into(&self, sections: &[Section]) -> Option<(Vec<Section>, Position)> {
        let section = match sections.iter().position(|s| s.id == self.destination_section) {
            Some(section) => section,
            None => {
                warn!(
                    "DragCoordinator: drop section '{}' is gone, using source section '{}'",
                    self.destination_section, self.source_section
                );
                sections.iter().position(|s| s.id == self.source_section)?
            }
        };
        if contains_row(&sections[section], self.block.id()) {
            warn!(
                "DragCoordinator: section '{}' already holds a row '{}'",
                sections[section].id,
                self.block.id()
            );
            return None;
        }

        let mut next = sections.to_vec();
        let row = self.destination_row.min(next[section].rows.len());
        if row != self.destination_row {
            warn!(
                "DragCoordinator: drop row {} clamped to {} in section '{}'",
                self.destination_row, row, next[section].id
            );
        }
        next[section].rows.insert(row, self.block.clone());
        Some((next, Position::new(section, row)))
    }

    /// The list with the row put back where the drag started.
    ///
    /// The source row index is clamped. When the source section disappeared, it is
    /// recreated at the end of the list holding only this row. `None` when the
    /// source section already holds a row with the same identity.
    pub fn restore_into(&self, sections: &[Section]) -> Option<(Vec<Section>, Position)> {
        let mut next = sections.to_vec();
        match next.iter().position(|s| s.id == self.source_section) {
            Some(section) => {
                if contains_row(&next[section], self.block.id()) {
                    debug!(
                        "DragCoordinator: row '{}' is back in section '{}' already",
                        self.block.id(),
                        self.source_section
                    );
                    return None;
                }
                let row = self.source.row.min(next[section].rows.len());
                next[section].rows.insert(row, self.block.clone());
                Some((next, Position::new(section, row)))
            }
            None => {
                let mut section = Section::new(self.source_section.clone());
                section.rows.push(self.block.clone());
                next.push(section);
                let position = Position::new(next.len() - 1, 0);
                Some((next, position))
            }
        }
    }
}

fn contains_row(section: &Section, identity: &Identity) -> bool {
    section.rows.iter().any(|b| b.id() == identity)
}

/// First half of a drop: the list without the dragged row, and the pending insert.
#[derive(Clone, Debug)]
pub struct DropPlan {
    pub after_removal: Vec<Section>,
    pub pending: PendingDrop,
}

/// Drag state owned by the renderer.
pub struct DragCoordinator {
    hooks: Box<dyn DragHooks>,
    session: Option<DragSession>,
    enabled: bool,
    preview: DragPreviewMask,
}

impl DragCoordinator {
    pub fn new(config: &RendererConfig) -> Self {
        DragCoordinator {
            hooks: Box::new(DefaultDragHooks),
            session: None,
            enabled: config.drag_enabled,
            preview: config.drag_preview,
        }
    }

    pub fn set_hooks(&mut self, hooks: impl DragHooks + 'static) {
        self.hooks = Box::new(hooks);
    }

    pub fn hooks_mut(&mut self) -> &mut dyn DragHooks {
        self.hooks.as_mut()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.session = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a session for the row at `position`. Yields at most one item.
    pub fn begin(&mut self, sections: &[Section], position: Position) -> Vec<DragItem> {
        if self.is_dragging() {
            debug!("DragCoordinator: new drag at {} replaces the current session", position);
            self.session = None;
        }
        if !self.enabled {
            trace!("DragCoordinator: drag at {} ignored, dragging is disabled", position);
            return Vec::new();
        }
        let Some(section) = sections.get(position.section) else {
            return Vec::new();
        };
        let Some(block) = section.rows.get(position.row) else {
            return Vec::new();
        };
        if !self.hooks.can_drag(position, block) {
            debug!("DragCoordinator: drag refused at {}", position);
            return Vec::new();
        }

        let session = DragSession {
            id: Uuid::new_v4(),
            section: section.id.clone(),
            row: block.id().clone(),
        };
        debug!("DragCoordinator: session {} started at {}", session.id, position);
        let item = DragItem {
            session: session.id,
            identity: session.row.clone(),
        };
        self.session = Some(session);
        self.hooks.drag_started();
        vec![item]
    }

    /// Current position of the dragged row.
    pub fn source(&self, sections: &[Section]) -> Option<Position> {
        let session = self.session.as_ref()?;
        find_row(sections, &session.section, &session.row)
    }

    pub fn proposal(
        &self,
        sections: &[Section],
        destination: Option<Position>,
        item_count: usize,
    ) -> DropProposal {
        let (Some(source), Some(destination)) = (self.source(sections), destination) else {
            return DropProposal::Cancel;
        };
        if item_count != 1 || !self.allows(source, destination, sections) {
            return DropProposal::Cancel;
        }
        DropProposal::Move
    }

    pub fn allows(&self, source: Position, destination: Position, sections: &[Section]) -> bool {
        self.hooks.can_drop(source, destination, sections)
    }

    /// Ends the session and plans the drop against `sections`.
    ///
    /// A missing destination means the end of the last section. `None` when there
    /// is no session, the dragged row no longer exists, or the hooks refuse the drop.
    /// Moving a row into another section that already holds its identity is a
    /// `DuplicateIdentity` error, and nothing is removed.
    pub fn plan_drop(
        &mut self,
        sections: &[Section],
        destination: Option<Position>,
    ) -> Result<Option<DropPlan>, BlocksError> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };
        let Some(source) = find_row(sections, &session.section, &session.row) else {
            warn!(
                "DragCoordinator: row '{}' of session {} is gone, drop ignored",
                session.row, session.id
            );
            return Ok(None);
        };
        let destination = match (destination, sections.len().checked_sub(1)) {
            (Some(destination), _) => destination,
            (None, Some(last)) => Position::new(last, sections[last].rows.len()),
            (None, None) => return Ok(None),
        };
        let Some(destination_section) = sections.get(destination.section) else {
            warn!("DragCoordinator: drop destination {} is out of bounds", destination);
            return Ok(None);
        };
        if !self.allows(source, destination, sections) {
            debug!(
                "DragCoordinator: session {} refused {} -> {}",
                session.id, source, destination
            );
            return Ok(None);
        }
        if destination.section != source.section {
            let existing = destination_section.rows.iter().position(|b| b.id() == &session.row);
            if let Some(first) = existing {
                return Err(BlocksError::DuplicateIdentity {
                    identity: session.row,
                    scope: IdentityScope::Rows {
                        section: destination_section.id.clone(),
                    },
                    first,
                    second: destination.row,
                });
            }
        }

        let mut after_removal = sections.to_vec();
        let block = after_removal[source.section].rows.remove(source.row);
        debug!(
            "DragCoordinator: session {} drops {} -> {}",
            session.id, source, destination
        );
        Ok(Some(DropPlan {
            after_removal,
            pending: PendingDrop {
                session: session.id,
                block,
                source,
                source_section: session.section,
                destination_section: destination_section.id.clone(),
                destination_row: destination.row,
            },
        }))
    }

    /// Ends the session without a drop.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("DragCoordinator: session {} cancelled", session.id);
        }
    }

    pub fn preview(&self, block: &Block, frame: Rect) -> PreviewPath {
        self.hooks
            .customize_drag_preview(block)
            .unwrap_or(self.preview)
            .apply(frame)
    }
}

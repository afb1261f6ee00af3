//! Built-in spacer row
use crate::component::{Block, Component};
use crate::errors::BlocksError;
use crate::registry::ComponentView;
use crate::types::Identity;
use std::any::Any;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpacerKind {
    /// Fills the blank space left in the viewport.
    Flexible,
    Fixed(f64),
}

/// Empty row used to push content apart or to the bottom of the viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct Spacer {
    id: Identity,
    kind: SpacerKind,
}

impl Spacer {
    pub fn flexible(id: impl Into<Identity>) -> Self {
        Spacer {
            id: id.into(),
            kind: SpacerKind::Flexible,
        }
    }

    pub fn fixed(id: impl Into<Identity>, height: f64) -> Self {
        Spacer {
            id: id.into(),
            kind: SpacerKind::Fixed(height),
        }
    }

    pub fn kind(&self) -> SpacerKind {
        self.kind
    }
}

impl Component for Spacer {
    fn id(&self) -> Identity {
        self.id.clone()
    }
}

#[derive(Debug, Default)]
pub struct SpacerView {
    kind: Option<SpacerKind>,
}

impl SpacerView {
    /// Height constraint of a fixed spacer.
    pub fn fixed_height(&self) -> Option<f64> {
        match self.kind {
            Some(SpacerKind::Fixed(height)) => Some(height),
            _ => None,
        }
    }
}

impl ComponentView for SpacerView {
    fn configure(&mut self, block: &Block) -> Result<(), BlocksError> {
        self.kind = Some(block.component::<Spacer>()?.kind);
        Ok(())
    }

    fn is_flexible(&self) -> bool {
        self.kind == Some(SpacerKind::Flexible)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::IntoBlock;

    #[test]
    fn a_reused_view_follows_its_latest_spacer() {
        let mut view = SpacerView::default();
        view.configure(&Spacer::flexible("gap").into_block()).expect("spacer");
        assert!(view.is_flexible());
        assert_eq!(view.fixed_height(), None);

        view.configure(&Spacer::fixed("gap", 24.0).into_block()).expect("spacer");
        assert!(!view.is_flexible());
        assert_eq!(view.fixed_height(), Some(24.0));
    }
}

//! View-model components and their type-erased, immutable `Block` wrapper
use crate::errors::BlocksError;
use crate::types::{Identity, TypeKey};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Application view-model rendered by one reusable view.
///
/// A component is rebuilt every time the list is redeclared. A changed entity is a
/// new value with the same [`Component::id`]; it is never mutated in place.
pub trait Component: Any + PartialEq + fmt::Debug {
    /// Identity, stable for the logical lifetime of the represented entity.
    fn id(&self) -> Identity;

    /// Decides whether a matched item needs to be reconfigured.
    fn is_content_equal(&self, other: &Self) -> bool {
        self == other
    }

    /// Called right before a view is configured with this component.
    fn prepare(&self) {}

    /// Called when the row showing this component is selected.
    fn on_select(&self, _deselect: &mut Deselect) {}
}

/// Lets a selected component ask for its row to be deselected.
#[derive(Debug, Default)]
pub struct Deselect {
    requested: Option<bool>,
}

impl Deselect {
    pub fn deselect(&mut self, animated: bool) {
        self.requested = Some(animated);
    }

    /// `Some(animated)` when deselection was requested.
    pub fn requested(&self) -> Option<bool> {
        self.requested
    }
}

trait ErasedComponent: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn content_eq(&self, other: &dyn Any) -> bool;
    fn prepare(&self);
    fn on_select(&self, deselect: &mut Deselect);
}

impl<C: Component> ErasedComponent for C {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn content_eq(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<C>()
            .is_some_and(|other| self.is_content_equal(other))
    }

    fn prepare(&self) {
        Component::prepare(self)
    }

    fn on_select(&self, deselect: &mut Deselect) {
        Component::on_select(self, deselect)
    }
}

/// One renderable unit: a row, or a section's header or footer.
///
/// Cloning is cheap and shares the component. Comparison is structural: see
/// [`Block::is_content_equal`].
#[derive(Clone)]
pub struct Block {
    inner: Rc<dyn ErasedComponent>,
    type_key: TypeKey,
    identity: Identity,
}

impl Block {
    pub fn new<C: Component>(component: C) -> Self {
        let identity = component.id();
        Block {
            inner: Rc::new(component),
            type_key: TypeKey::of::<C>(),
            identity,
        }
    }

    pub fn id(&self) -> &Identity {
        &self.identity
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn is<C: Component>(&self) -> bool {
        self.type_key == TypeKey::of::<C>()
    }

    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        self.inner.as_any().downcast_ref::<C>()
    }

    /// Checked access to the concrete component.
    pub fn component<C: Component>(&self) -> Result<&C, BlocksError> {
        self.downcast_ref::<C>().ok_or(BlocksError::TypeMismatch {
            expected: TypeKey::of::<C>().short_name(),
            actual: self.type_key.short_name(),
        })
    }

    /// Both blocks share the same component allocation.
    pub fn ptr_eq(&self, other: &Block) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Same concrete type and equal content. Identity is not compared.
    pub fn is_content_equal(&self, other: &Block) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.type_key == other.type_key && self.inner.content_eq(other.inner.as_any())
    }

    pub fn prepare(&self) {
        self.inner.prepare();
    }

    pub fn on_select(&self, deselect: &mut Deselect) {
        self.inner.on_select(deselect);
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.identity)
            .field("component", &self.inner)
            .finish()
    }
}

/// Conversion into a [`Block`].
pub trait IntoBlock {
    fn into_block(self) -> Block;
}

impl<C: Component> IntoBlock for C {
    fn into_block(self) -> Block {
        Block::new(self)
    }
}

impl IntoBlock for Block {
    fn into_block(self) -> Block {
        self
    }
}

/// Converts a sequence of components into blocks, keeping their order.
pub fn into_blocks<I>(items: I) -> Vec<Block>
where
    I: IntoIterator,
    I::Item: IntoBlock,
{
    items.into_iter().map(IntoBlock::into_block).collect()
}

//! Typed registry mapping component types to reusable views
use crate::component::{Block, Component};
use crate::errors::BlocksError;
use crate::types::{short_type_name, TypeKey};
use indexmap::IndexMap;
use log::{debug, warn};
use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

/// Contract every reusable cell, header and footer view implements.
pub trait ComponentView: Any {
    /// Binds the view to `block`. Called every time the view is (re)used.
    fn configure(&mut self, block: &Block) -> Result<(), BlocksError>;

    /// The view expands to share the blank space left in the viewport.
    fn is_flexible(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Fallback placed in a slot whose view could not be produced.
#[derive(Debug, Default)]
pub struct EmptyView;

impl ComponentView for EmptyView {
    fn configure(&mut self, _block: &Block) -> Result<(), BlocksError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// What the widget hands back when asked for a reusable view.
pub enum DequeuedView {
    Component(Box<dyn ComponentView>),
    /// A view that does not implement [`ComponentView`].
    Foreign(Box<dyn Any>),
}

/// A concrete view type that can be constructed without external resources.
#[derive(Clone, Copy)]
pub struct ViewClass {
    name: &'static str,
    construct: fn() -> Box<dyn ComponentView>,
}

fn construct_default<V: ComponentView + Default>() -> Box<dyn ComponentView> {
    Box::new(V::default())
}

impl ViewClass {
    pub fn of<V: ComponentView + Default>() -> Self {
        ViewClass {
            name: short_type_name(type_name::<V>()),
            construct: construct_default::<V>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self) -> Box<dyn ComponentView> {
        (self.construct)()
    }
}

impl fmt::Debug for ViewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewClass({})", self.name)
    }
}

/// Builds embedded declarative content from a component.
pub type HostedFactory = Rc<dyn Fn(&Block) -> Result<Box<dyn ComponentView>, BlocksError>>;

/// Container view for embedded declarative content.
///
/// The content is rebuilt from the component on every configuration.
pub struct HostingView {
    factory: HostedFactory,
    content: Option<Box<dyn ComponentView>>,
}

impl HostingView {
    pub fn new(factory: HostedFactory) -> Self {
        HostingView {
            factory,
            content: None,
        }
    }

    pub fn content(&self) -> Option<&dyn ComponentView> {
        self.content.as_deref()
    }
}

impl ComponentView for HostingView {
    fn configure(&mut self, block: &Block) -> Result<(), BlocksError> {
        self.content = Some((self.factory)(block)?);
        Ok(())
    }

    fn is_flexible(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.is_flexible())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// How the widget obtains views for one reuse identifier.
#[derive(Clone)]
pub enum ViewSource {
    /// Loaded by the widget from a named resource file.
    Resource(String),
    Class(ViewClass),
    Hosted(HostedFactory),
}

impl ViewSource {
    /// Creates a fresh view, except for resource-backed sources which only the
    /// widget can load.
    pub fn instantiate(&self) -> Option<Box<dyn ComponentView>> {
        match self {
            ViewSource::Resource(_) => None,
            ViewSource::Class(class) => Some(class.instantiate()),
            ViewSource::Hosted(factory) => Some(Box::new(HostingView::new(factory.clone()))),
        }
    }
}

impl fmt::Debug for ViewSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSource::Resource(name) => write!(f, "Resource({})", name),
            ViewSource::Class(class) => write!(f, "Class({})", class.name()),
            ViewSource::Hosted(_) => f.write_str("Hosted(<factory>)"),
        }
    }
}

/// A resolved view association.
#[derive(Clone, Debug)]
pub struct Registration {
    pub reuse_identifier: String,
    pub source: ViewSource,
}

/// Three independent type → view mappings, resolved in the order resource, class,
/// hosted. Registering a type again for the same mechanism replaces the previous
/// association.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    resources: IndexMap<TypeKey, String>,
    classes: IndexMap<TypeKey, ViewClass>,
    hosted: IndexMap<TypeKey, HostedFactory>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_resource<C: Component>(&mut self, resource_name: impl Into<String>) {
        let key = TypeKey::of::<C>();
        let resource_name = resource_name.into();
        debug!("ViewRegistry: {} -> resource '{}'", key.short_name(), resource_name);
        if let Some(previous) = self.resources.insert(key, resource_name) {
            warn!("ViewRegistry: replaced resource '{}' for {}", previous, key.short_name());
        }
    }

    pub fn register_class<C: Component, V: ComponentView + Default>(&mut self) {
        self.register_view_class::<C>(ViewClass::of::<V>());
    }

    pub fn register_view_class<C: Component>(&mut self, class: ViewClass) {
        let key = TypeKey::of::<C>();
        debug!("ViewRegistry: {} -> class {}", key.short_name(), class.name());
        if let Some(previous) = self.classes.insert(key, class) {
            warn!("ViewRegistry: replaced class {} for {}", previous.name(), key.short_name());
        }
    }

    /// Registers a declarative view built from the typed component.
    pub fn register_hosted<C, F>(&mut self, factory: F)
    where
        C: Component,
        F: Fn(&C) -> Box<dyn ComponentView> + 'static,
    {
        let key = TypeKey::of::<C>();
        let erased: HostedFactory = Rc::new(move |block: &Block| Ok(factory(block.component::<C>()?)));
        debug!("ViewRegistry: {} -> hosted view", key.short_name());
        if self.hosted.insert(key, erased).is_some() {
            warn!("ViewRegistry: replaced hosted view for {}", key.short_name());
        }
    }

    pub fn resolve_type(&self, key: TypeKey) -> Option<Registration> {
        if let Some(name) = self.resources.get(&key) {
            return Some(Registration {
                reuse_identifier: name.clone(),
                source: ViewSource::Resource(name.clone()),
            });
        }
        if let Some(class) = self.classes.get(&key) {
            return Some(Registration {
                reuse_identifier: class.name().to_string(),
                source: ViewSource::Class(*class),
            });
        }
        self.hosted.get(&key).map(|factory| Registration {
            reuse_identifier: format!("Hosted<{}>", key.short_name()),
            source: ViewSource::Hosted(factory.clone()),
        })
    }

    pub fn resolve(&self, block: &Block) -> Result<Registration, BlocksError> {
        let key = block.type_key();
        self.resolve_type(key)
            .ok_or(BlocksError::ViewNotRegistered {
                component: key.short_name(),
            })
    }

    #[cfg(test)]
    pub fn reuse_identifier(&self, block: &Block) -> Result<String, BlocksError> {
        self.resolve(block).map(|r| r.reuse_identifier)
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("resources", &self.resources.values().collect::<Vec<_>>())
            .field("classes", &self.classes.values().collect::<Vec<_>>())
            .field("hosted", &self.hosted.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::IntoBlock;
    use crate::types::Identity;

    #[derive(Debug, PartialEq)]
    struct Todo {
        id: i64,
        title: String,
    }

    impl Component for Todo {
        fn id(&self) -> Identity {
            self.id.into()
        }
    }

    #[derive(Default)]
    struct TodoCell {
        title: String,
    }

    impl ComponentView for TodoCell {
        fn configure(&mut self, block: &Block) -> Result<(), BlocksError> {
            self.title = block.component::<Todo>()?.title.clone();
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn todo() -> Block {
        Todo {
            id: 1,
            title: "Buy milk".into(),
        }
        .into_block()
    }

    #[test]
    fn unregistered_type_fails_with_its_name() {
        let registry = ViewRegistry::new();
        match registry.resolve(&todo()) {
            Err(BlocksError::ViewNotRegistered { component }) => assert_eq!(component, "Todo"),
            other => panic!("unexpected: {:?}", other.map(|r| r.reuse_identifier)),
        }
    }

    #[test]
    fn resource_wins_over_class_and_hosted() {
        let mut registry = ViewRegistry::new();
        registry.register_hosted::<Todo, _>(|_| Box::new(EmptyView));
        assert_eq!(registry.reuse_identifier(&todo()).ok().as_deref(), Some("Hosted<Todo>"));

        registry.register_class::<Todo, TodoCell>();
        assert_eq!(registry.reuse_identifier(&todo()).ok().as_deref(), Some("TodoCell"));

        registry.register_resource::<Todo>("TodoCellResource");
        assert_eq!(
            registry.reuse_identifier(&todo()).ok().as_deref(),
            Some("TodoCellResource")
        );
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = ViewRegistry::new();
        registry.register_resource::<Todo>("First");
        registry.register_resource::<Todo>("Second");
        assert_eq!(registry.reuse_identifier(&todo()).ok().as_deref(), Some("Second"));
    }

    #[test]
    fn class_source_instantiates_configurable_views() {
        let mut registry = ViewRegistry::new();
        registry.register_class::<Todo, TodoCell>();
        let registration = registry.resolve(&todo()).expect("registered");
        let mut view = registration.source.instantiate().expect("class views are constructible");
        view.configure(&todo()).expect("configures");
        let cell = view.as_any().downcast_ref::<TodoCell>().expect("TodoCell");
        assert_eq!(cell.title, "Buy milk");
    }

    #[test]
    fn hosted_view_builds_content_from_the_typed_component() {
        let mut registry = ViewRegistry::new();
        registry.register_hosted::<Todo, _>(|todo| {
            Box::new(TodoCell {
                title: todo.title.to_uppercase(),
            })
        });
        let registration = registry.resolve(&todo()).expect("registered");
        let mut view = registration.source.instantiate().expect("hosted views are constructible");
        view.configure(&todo()).expect("configures");

        let hosting = view.as_any().downcast_ref::<HostingView>().expect("HostingView");
        let content = hosting
            .content()
            .and_then(|c| c.as_any().downcast_ref::<TodoCell>())
            .expect("content");
        assert_eq!(content.title, "BUY MILK");
    }

    #[test]
    fn resource_sources_are_left_to_the_widget() {
        assert!(ViewSource::Resource("Nib".into()).instantiate().is_none());
    }
}

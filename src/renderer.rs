//! Owner of the current section list and bridge to the native list widget
//!
//! Every change goes through [`Renderer::update_sections`]: the new list is
//! validated and diffed against the current one, views are resolved and
//! registered, the list is swapped, and the widget receives ordered mutation
//! batches. Between updates the widget pulls views and heights through the
//! data-source callbacks.
use crate::component::{Block, Component, Deselect, IntoBlock};
use crate::config::RendererConfig;
use crate::converters::{batches_for, batches_to_json};
use crate::diff_engine::diff;
use crate::drag_drop::{DragCoordinator, DragHooks, DragItem, DropProposal, PendingDrop, PreviewPath};
use crate::errors::BlocksError;
use crate::flexible_height::{solve, FlexibleLayout, MeasuredElement, SlotTable, SolverOptions};
use crate::registry::{ComponentView, DequeuedView, EmptyView, ViewClass, ViewRegistry, ViewSource};
use crate::scheduler::{DeferredQueue, DeferredTask};
use crate::section::{block_at, element_key, Section};
use crate::spacer::{Spacer, SpacerView};
use crate::types::*;
use indexmap::{IndexMap, IndexSet};
use log::{debug, error, log_enabled, trace, warn, Level};

/// Identity of the section created by the single-section row API.
pub const DEFAULT_SECTION_ID: i64 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewRole {
    Cell,
    HeaderFooter,
}

/// The native scrollable list, as seen by the renderer.
pub trait ListWidget {
    fn register_cell(&mut self, reuse_identifier: &str, source: &ViewSource);

    fn register_header_footer(&mut self, reuse_identifier: &str, source: &ViewSource);

    /// Applies one batch update, inside a no-animation scope when
    /// `batch.is_animated()` is false. `sections` is the list after the batch.
    fn perform_batch(&mut self, batch: &MutationBatch, sections: &[Section]);

    fn reload_data(&mut self, sections: &[Section]);

    /// A recycled or fresh view for `reuse_identifier`, or `None` when the widget
    /// has nothing registered under it.
    fn dequeue_cell(&mut self, reuse_identifier: &str, position: Position) -> Option<DequeuedView>;

    fn dequeue_header_footer(&mut self, reuse_identifier: &str, section: usize) -> Option<DequeuedView>;

    fn visible_slots(&self) -> Vec<ElementSlot>;

    /// Natural height of a visible element after the last layout pass.
    fn measured_height(&self, slot: ElementSlot) -> f64;

    fn viewport(&self) -> Viewport;

    fn set_flexible_height(&mut self, slot: ElementSlot, height: f64);

    fn request_layout(&mut self, animated: bool);

    /// Asks the host to call [`Renderer::run_deferred`] once the current frame is done.
    fn schedule_idle_turn(&mut self);

    fn deselect_row(&mut self, position: Position, animated: bool);

    fn set_drag_interaction_enabled(&mut self, enabled: bool);
}

pub trait RendererDelegate {
    fn did_select_row(&mut self, _block: &Block, _position: Position) {}
}

type Estimate<T> = Box<dyn Fn(T) -> Dimension>;

pub struct Renderer {
    sections: Vec<Section>,
    registry: ViewRegistry,
    registered: IndexSet<(ViewRole, String)>,
    config: RendererConfig,
    drag: DragCoordinator,
    layout: SlotTable,
    deferred: DeferredQueue,
    delegate: Option<Box<dyn RendererDelegate>>,
    estimated_row: Option<Estimate<Position>>,
    estimated_header: Option<Estimate<usize>>,
    estimated_footer: Option<Estimate<usize>>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::build(RendererConfig::default())
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RendererConfig) -> Result<Self, BlocksError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RendererConfig) -> Self {
        let mut registry = ViewRegistry::new();
        registry.register_view_class::<Spacer>(ViewClass::of::<SpacerView>());
        Renderer {
            sections: Vec::new(),
            registry,
            registered: IndexSet::new(),
            drag: DragCoordinator::new(&config),
            config,
            layout: SlotTable::new(),
            deferred: DeferredQueue::new(),
            delegate: None,
            estimated_row: None,
            estimated_header: None,
            estimated_footer: None,
        }
    }

    /// Pushes initial state to a freshly connected widget.
    pub fn attach<W: ListWidget>(&mut self, widget: &mut W) {
        widget.set_drag_interaction_enabled(self.drag.is_enabled());
        widget.reload_data(&self.sections);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Flexible flags of configured elements.
    pub fn slot_table(&self) -> &SlotTable {
        &self.layout
    }

    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    pub fn set_delegate(&mut self, delegate: impl RendererDelegate + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    // Registration

    pub fn register_resource<C: Component>(&mut self, resource_name: impl Into<String>) {
        self.registry.register_resource::<C>(resource_name);
    }

    pub fn register_class<C: Component, V: ComponentView + Default>(&mut self) {
        self.registry.register_class::<C, V>();
    }

    pub fn register_hosted<C, F>(&mut self, factory: F)
    where
        C: Component,
        F: Fn(&C) -> Box<dyn ComponentView> + 'static,
    {
        self.registry.register_hosted::<C, F>(factory);
    }

    pub fn set_estimated_row_height(&mut self, estimate: impl Fn(Position) -> Dimension + 'static) {
        self.estimated_row = Some(Box::new(estimate));
    }

    pub fn set_estimated_header_height(&mut self, estimate: impl Fn(usize) -> Dimension + 'static) {
        self.estimated_header = Some(Box::new(estimate));
    }

    pub fn set_estimated_footer_height(&mut self, estimate: impl Fn(usize) -> Dimension + 'static) {
        self.estimated_footer = Some(Box::new(estimate));
    }

    // Updates

    /// Replaces the list with `sections` and animates the difference.
    ///
    /// Nothing changes when the new list has duplicate identities or contains a
    /// component type without a registered view.
    pub fn update_sections<W: ListWidget>(
        &mut self,
        widget: &mut W,
        sections: Vec<Section>,
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError> {
        let script = diff(&self.sections, &sections)?;
        let views = self.resolve_views(&sections)?;
        self.register_views(widget, views);

        self.sections = sections;
        if script.is_empty() {
            trace!("Renderer: no changes");
            return Ok(script);
        }

        let batches = batches_for(&script, animation);
        if log_enabled!(Level::Debug) {
            match batches_to_json(&batches) {
                Ok(json) => debug!("Renderer: applying {}", json),
                Err(err) => warn!("Renderer: could not serialize batches: {}", err),
            }
        }
        for batch in &batches {
            widget.perform_batch(batch, &self.sections);
        }

        self.layout.prune(&self.sections);
        if self.config.expand_flexible_after_update {
            self.schedule_flexible_expansion(widget, animation.is_animated());
        }
        Ok(script)
    }

    /// Same as [`Renderer::update_sections`] with the configured default animation.
    pub fn set_sections<W: ListWidget>(
        &mut self,
        widget: &mut W,
        sections: Vec<Section>,
    ) -> Result<EditScript, BlocksError> {
        let animation = self.config.default_animation;
        self.update_sections(widget, sections, animation)
    }

    /// Shows `rows` in a single section, without animation.
    pub fn set_rows<W, I>(&mut self, widget: &mut W, rows: I) -> Result<EditScript, BlocksError>
    where
        W: ListWidget,
        I: IntoIterator,
        I::Item: IntoBlock,
    {
        let section = Section::new(DEFAULT_SECTION_ID).with_rows(rows);
        self.update_sections(widget, vec![section], AnimationStyle::None)
    }

    /// Adds `row` at the end of the last section.
    pub fn append_row<W: ListWidget>(
        &mut self,
        widget: &mut W,
        row: impl IntoBlock,
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError> {
        let mut next = self.sections.clone();
        match next.last_mut() {
            Some(section) => section.rows.push(row.into_block()),
            None => next.push(Section::new(DEFAULT_SECTION_ID).with_rows([row.into_block()])),
        }
        self.update_sections(widget, next, animation)
    }

    pub fn insert_row<W: ListWidget>(
        &mut self,
        widget: &mut W,
        row: impl IntoBlock,
        at: Position,
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError> {
        self.insert_rows(widget, [row.into_block()], at, animation)
    }

    /// Inserts `rows` consecutively, the first one at `at`.
    pub fn insert_rows<W, I>(
        &mut self,
        widget: &mut W,
        rows: I,
        at: Position,
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError>
    where
        W: ListWidget,
        I: IntoIterator,
        I::Item: IntoBlock,
    {
        let mut next = self.sections.clone();
        let section = slot_get!(next.get_mut(at.section), ElementSlot::Row(at));
        if at.row > section.rows.len() {
            return Err(BlocksError::InvalidModel {
                slot: ElementSlot::Row(at),
            });
        }
        let tail = section.rows.split_off(at.row);
        section.rows.extend(rows.into_iter().map(IntoBlock::into_block));
        section.rows.extend(tail);
        self.update_sections(widget, next, animation)
    }

    pub fn remove_row<W: ListWidget>(
        &mut self,
        widget: &mut W,
        position: Position,
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError> {
        self.remove_rows(widget, &[position], animation)
    }

    /// Removes the rows at `positions`, all expressed against the current list.
    pub fn remove_rows<W: ListWidget>(
        &mut self,
        widget: &mut W,
        positions: &[Position],
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError> {
        let mut positions = positions.to_vec();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();

        let mut next = self.sections.clone();
        for position in positions {
            let slot = ElementSlot::Row(position);
            let section = slot_get!(next.get_mut(position.section), slot);
            if position.row >= section.rows.len() {
                return Err(BlocksError::InvalidModel { slot });
            }
            section.rows.remove(position.row);
        }
        self.update_sections(widget, next, animation)
    }

    /// Removes every row whose component is a `C`.
    pub fn remove_components<C: Component, W: ListWidget>(
        &mut self,
        widget: &mut W,
        animation: AnimationStyle,
    ) -> Result<EditScript, BlocksError> {
        let mut next = self.sections.clone();
        for section in &mut next {
            section.rows.retain(|block| !block.is::<C>());
        }
        self.update_sections(widget, next, animation)
    }

    /// Full reload without diffing.
    pub fn reload<W: ListWidget>(&mut self, widget: &mut W) {
        widget.reload_data(&self.sections);
        self.layout.prune(&self.sections);
        if self.config.expand_flexible_after_update {
            self.schedule_flexible_expansion(widget, false);
        }
    }

    fn resolve_views(
        &self,
        sections: &[Section],
    ) -> Result<IndexMap<(ViewRole, String), ViewSource>, BlocksError> {
        let mut seen = IndexSet::new();
        let mut views = IndexMap::new();
        for section in sections {
            let supplementaries = section
                .header
                .iter()
                .chain(section.footer.iter())
                .map(|block| (ViewRole::HeaderFooter, block));
            let rows = section.rows.iter().map(|block| (ViewRole::Cell, block));

            for (role, block) in supplementaries.chain(rows) {
                if !seen.insert((role, block.type_key())) {
                    continue;
                }
                let registration = self.registry.resolve(block)?;
                views.insert((role, registration.reuse_identifier), registration.source);
            }
        }
        Ok(views)
    }

    fn register_views<W: ListWidget>(
        &mut self,
        widget: &mut W,
        views: IndexMap<(ViewRole, String), ViewSource>,
    ) {
        for (key, source) in views {
            if self.registered.contains(&key) {
                continue;
            }
            let (role, reuse_identifier) = &key;
            match role {
                ViewRole::Cell => widget.register_cell(reuse_identifier, &source),
                ViewRole::HeaderFooter => widget.register_header_footer(reuse_identifier, &source),
            }
            debug!("Renderer: registered {:?} '{}' ({:?})", role, reuse_identifier, source);
            self.registered.insert(key);
        }
    }

    // Data source

    pub fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn number_of_rows(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, |s| s.rows.len())
    }

    pub fn row(&self, position: Position) -> Option<&Block> {
        block_at(&self.sections, ElementSlot::Row(position))
    }

    pub fn header(&self, section: usize) -> Option<&Block> {
        block_at(&self.sections, ElementSlot::Header(section))
    }

    pub fn footer(&self, section: usize) -> Option<&Block> {
        block_at(&self.sections, ElementSlot::Footer(section))
    }

    pub fn try_cell_for_row<W: ListWidget>(
        &mut self,
        widget: &mut W,
        position: Position,
    ) -> Result<Box<dyn ComponentView>, BlocksError> {
        self.configure_view(widget, ElementSlot::Row(position))
    }

    pub fn try_header_view<W: ListWidget>(
        &mut self,
        widget: &mut W,
        section: usize,
    ) -> Result<Box<dyn ComponentView>, BlocksError> {
        self.configure_view(widget, ElementSlot::Header(section))
    }

    pub fn try_footer_view<W: ListWidget>(
        &mut self,
        widget: &mut W,
        section: usize,
    ) -> Result<Box<dyn ComponentView>, BlocksError> {
        self.configure_view(widget, ElementSlot::Footer(section))
    }

    /// The configured cell for `position`, or an [`EmptyView`] when it cannot be produced.
    pub fn cell_for_row<W: ListWidget>(&mut self, widget: &mut W, position: Position) -> Box<dyn ComponentView> {
        self.view_or_fallback(widget, ElementSlot::Row(position))
    }

    pub fn header_view<W: ListWidget>(&mut self, widget: &mut W, section: usize) -> Box<dyn ComponentView> {
        self.view_or_fallback(widget, ElementSlot::Header(section))
    }

    pub fn footer_view<W: ListWidget>(&mut self, widget: &mut W, section: usize) -> Box<dyn ComponentView> {
        self.view_or_fallback(widget, ElementSlot::Footer(section))
    }

    fn view_or_fallback<W: ListWidget>(&mut self, widget: &mut W, slot: ElementSlot) -> Box<dyn ComponentView> {
        self.configure_view(widget, slot).unwrap_or_else(|err| {
            error!("Renderer: cannot provide a view for {}: {}", slot, err);
            Box::new(EmptyView)
        })
    }

    fn configure_view<W: ListWidget>(
        &mut self,
        widget: &mut W,
        slot: ElementSlot,
    ) -> Result<Box<dyn ComponentView>, BlocksError> {
        let block = slot_get!(block_at(&self.sections, slot), slot).clone();
        let registration = self.registry.resolve(&block)?;
        let reuse_identifier = registration.reuse_identifier;

        let dequeued = match slot {
            ElementSlot::Row(position) => widget.dequeue_cell(&reuse_identifier, position),
            ElementSlot::Header(section) | ElementSlot::Footer(section) => {
                widget.dequeue_header_footer(&reuse_identifier, section)
            }
        };
        let mut view = match dequeued {
            Some(DequeuedView::Component(view)) => view,
            Some(DequeuedView::Foreign(_)) => return Err(BlocksError::InvalidViewClass { reuse_identifier }),
            None => match registration.source.instantiate() {
                Some(view) => view,
                None => return Err(BlocksError::InvalidViewClass { reuse_identifier }),
            },
        };

        block.prepare();
        view.configure(&block)?;
        if let Some(key) = element_key(&self.sections, slot) {
            self.layout.record(key, view.is_flexible());
        }
        Ok(view)
    }

    pub fn height_for_row(&self, _position: Position) -> Dimension {
        Dimension::Automatic
    }

    /// Sections without a header collapse their header area.
    pub fn height_for_header(&self, section: usize) -> Dimension {
        match self.header(section) {
            Some(_) => Dimension::Automatic,
            None => Dimension::LEAST,
        }
    }

    pub fn height_for_footer(&self, section: usize) -> Dimension {
        match self.footer(section) {
            Some(_) => Dimension::Automatic,
            None => Dimension::LEAST,
        }
    }

    pub fn estimated_height_for_row(&self, position: Position) -> Dimension {
        self.estimated_row
            .as_ref()
            .map_or(Dimension::Automatic, |estimate| estimate(position))
    }

    pub fn estimated_height_for_header(&self, section: usize) -> Dimension {
        self.estimated_header
            .as_ref()
            .map_or(Dimension::Automatic, |estimate| estimate(section))
    }

    pub fn estimated_height_for_footer(&self, section: usize) -> Dimension {
        self.estimated_footer
            .as_ref()
            .map_or(Dimension::Automatic, |estimate| estimate(section))
    }

    pub fn did_select_row<W: ListWidget>(&mut self, widget: &mut W, position: Position) {
        let Some(block) = self.row(position).cloned() else {
            warn!("Renderer: selection of missing row {}", position);
            return;
        };
        let mut deselect = Deselect::default();
        block.on_select(&mut deselect);
        if let Some(animated) = deselect.requested() {
            widget.deselect_row(position, animated);
        }
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_select_row(&block, position);
        }
    }

    // Flexible height

    /// Runs a flexible-height pass now, or on the next idle turn when `asynchronously`.
    pub fn expand_flexible_elements<W: ListWidget>(
        &mut self,
        widget: &mut W,
        animated: bool,
        asynchronously: bool,
    ) -> Option<FlexibleLayout> {
        if asynchronously {
            self.schedule_flexible_expansion(widget, animated);
            return None;
        }
        Some(self.flexible_pass(widget, animated))
    }

    pub fn schedule_flexible_expansion<W: ListWidget>(&mut self, widget: &mut W, animated: bool) {
        self.defer(widget, DeferredTask::ExpandFlexible { animated });
    }

    /// The viewport was resized or its insets changed.
    pub fn viewport_did_change<W: ListWidget>(&mut self, widget: &mut W) {
        self.schedule_flexible_expansion(widget, false);
    }

    fn flexible_pass<W: ListWidget>(&self, widget: &mut W, animated: bool) -> FlexibleLayout {
        let elements: Vec<MeasuredElement> = widget
            .visible_slots()
            .into_iter()
            .filter_map(|slot| {
                let key = element_key(&self.sections, slot)?;
                Some(if self.layout.is_flexible(&key) {
                    MeasuredElement::flexible(slot)
                } else {
                    MeasuredElement::fixed(slot, widget.measured_height(slot))
                })
            })
            .collect();

        let layout = solve(widget.viewport(), &elements, SolverOptions::from(&self.config));
        trace!(
            "Renderer: blank space {} shared by {} visible of {} flexible elements",
            layout.available_space,
            layout.assignments.len(),
            self.layout.flexible_count()
        );
        if !layout.assignments.is_empty() {
            for &(slot, height) in &layout.assignments {
                widget.set_flexible_height(slot, height);
            }
            widget.request_layout(animated);
        }
        layout
    }

    // Deferred work

    fn defer<W: ListWidget>(&mut self, widget: &mut W, task: DeferredTask) {
        if self.deferred.push(task) {
            widget.schedule_idle_turn();
        }
    }

    /// Runs the tasks queued before this call. Returns how many ran.
    pub fn run_deferred<W: ListWidget>(&mut self, widget: &mut W) -> usize {
        let tasks = self.deferred.take();
        let count = tasks.len();
        for task in tasks {
            match task {
                DeferredTask::ExpandFlexible { animated } => {
                    self.flexible_pass(widget, animated);
                }
                DeferredTask::CompleteDrop(pending) => self.complete_drop(widget, pending),
            }
        }
        count
    }

    // Drag and drop

    pub fn set_drag_hooks(&mut self, hooks: impl DragHooks + 'static) {
        self.drag.set_hooks(hooks);
    }

    pub fn is_drag_enabled(&self) -> bool {
        self.drag.is_enabled()
    }

    pub fn set_drag_enabled<W: ListWidget>(&mut self, widget: &mut W, enabled: bool) {
        self.drag.set_enabled(enabled);
        widget.set_drag_interaction_enabled(enabled);
    }

    pub fn begin_drag(&mut self, position: Position) -> Vec<DragItem> {
        self.drag.begin(&self.sections, position)
    }

    pub fn drop_proposal(&self, destination: Option<Position>, item_count: usize) -> DropProposal {
        self.drag.proposal(&self.sections, destination, item_count)
    }

    pub fn drag_preview(&self, position: Position, frame: Rect) -> Option<PreviewPath> {
        self.row(position).map(|block| self.drag.preview(block, frame))
    }

    pub fn end_drag(&mut self) {
        self.drag.cancel();
    }

    /// Removes the dragged row now and inserts it at `destination` on the next idle
    /// turn. Returns `false` when there was nothing to drop or the hooks refused it.
    ///
    /// Moving a row into another section that already holds its identity fails with
    /// `DuplicateIdentity` and leaves the list untouched.
    pub fn perform_drop<W: ListWidget>(
        &mut self,
        widget: &mut W,
        destination: Option<Position>,
    ) -> Result<bool, BlocksError> {
        let Some(plan) = self.drag.plan_drop(&self.sections, destination)? else {
            return Ok(false);
        };
        let animation = self.config.default_animation;
        self.update_sections(widget, plan.after_removal, animation)?;
        self.defer(widget, DeferredTask::CompleteDrop(plan.pending));
        Ok(true)
    }

    fn complete_drop<W: ListWidget>(&mut self, widget: &mut W, pending: PendingDrop) {
        let landing = pending.insert_into(&self.sections).filter(|(_, destination)| {
            let allowed = self.drag.allows(pending.source, *destination, &self.sections);
            if !allowed {
                debug!(
                    "Renderer: drop of '{}' at {} refused by the current list",
                    pending.block.id(),
                    destination
                );
            }
            allowed
        });
        if let Some((sections, destination)) = landing {
            match self.update_sections(widget, sections, AnimationStyle::Fade) {
                Ok(_) => {
                    self.drag
                        .hooks_mut()
                        .drop_completed(pending.source, destination, &self.sections);
                    return;
                }
                Err(err) => error!("Renderer: drop of '{}' failed: {}", pending.block.id(), err),
            }
        }
        self.restore_dropped_row(widget, &pending);
    }

    fn restore_dropped_row<W: ListWidget>(&mut self, widget: &mut W, pending: &PendingDrop) {
        let Some((sections, position)) = pending.restore_into(&self.sections) else {
            return;
        };
        warn!("Renderer: dropped row '{}' returned to {}", pending.block.id(), position);
        if let Err(err) = self.update_sections(widget, sections, AnimationStyle::Fade) {
            error!(
                "Renderer: could not return dropped row '{}': {}",
                pending.block.id(),
                err
            );
        }
    }
}

//! Distribution of blank viewport space among flexible elements
//!
//! A layout pass has two steps. Every visible element is first classified: a
//! flexible element (its configured view opted into elastic sizing) is never
//! measured, a fixed element contributes its natural height. The blank space,
//! `viewport − Σ fixed − top chrome − bottom inset`, is then shared evenly by the
//! flexible elements, each getting at least the configured floor.
use crate::config::{RendererConfig, DEFAULT_MINIMUM_FLEXIBLE_HEIGHT};
use crate::section::Section;
use crate::types::{ElementKey, ElementRef, ElementSlot, Identity, Viewport};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum ElementHeight {
    Flexible,
    /// Natural height reported by the widget.
    Fixed(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeasuredElement {
    pub slot: ElementSlot,
    pub height: ElementHeight,
}

impl MeasuredElement {
    pub fn flexible(slot: ElementSlot) -> Self {
        MeasuredElement {
            slot,
            height: ElementHeight::Flexible,
        }
    }

    pub fn fixed(slot: ElementSlot, height: f64) -> Self {
        MeasuredElement {
            slot,
            height: ElementHeight::Fixed(height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SolverOptions {
    /// Always positive.
    pub minimum_height: f64,
    pub pixel_scale: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            minimum_height: DEFAULT_MINIMUM_FLEXIBLE_HEIGHT,
            pixel_scale: None,
        }
    }
}

impl From<&RendererConfig> for SolverOptions {
    fn from(config: &RendererConfig) -> Self {
        SolverOptions {
            minimum_height: config.minimum_flexible_height,
            pixel_scale: config.pixel_scale,
        }
    }
}

/// Result of one solver pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FlexibleLayout {
    /// Fixed heights plus top chrome and bottom inset.
    pub consumed: f64,
    /// May be negative when fixed content overflows the viewport.
    pub available_space: f64,
    /// `None` when there is no flexible element.
    pub per_element_height: Option<f64>,
    /// Flexible slots in input order, with their heights.
    pub assignments: Vec<(ElementSlot, f64)>,
}

impl FlexibleLayout {
    pub fn total_assigned(&self) -> f64 {
        self.assignments.iter().map(|(_, h)| h).sum()
    }
}

pub fn solve(viewport: Viewport, elements: &[MeasuredElement], options: SolverOptions) -> FlexibleLayout {
    let fixed: f64 = elements
        .iter()
        .filter_map(|e| match e.height {
            ElementHeight::Fixed(h) => Some(h),
            ElementHeight::Flexible => None,
        })
        .sum();
    let consumed = fixed + viewport.top_chrome + viewport.bottom_inset;
    let available_space = viewport.height - consumed;

    let flexible: Vec<ElementSlot> = elements
        .iter()
        .filter(|e| e.height == ElementHeight::Flexible)
        .map(|e| e.slot)
        .collect();
    if flexible.is_empty() {
        return FlexibleLayout {
            consumed,
            available_space,
            ..FlexibleLayout::default()
        };
    }

    let mut height = available_space / flexible.len() as f64;
    if let Some(scale) = options.pixel_scale {
        height = (height * scale).floor() / scale;
    }
    if height < options.minimum_height {
        height = options.minimum_height;
    }

    FlexibleLayout {
        consumed,
        available_space,
        per_element_height: Some(height),
        assignments: flexible.into_iter().map(|slot| (slot, height)).collect(),
    }
}

/// Side table recording which configured elements opted into elastic sizing.
///
/// Keyed by [`ElementKey`], so entries follow their element across moves.
#[derive(Debug, Default)]
pub struct SlotTable {
    flexible: IndexMap<ElementKey, bool>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: ElementKey, flexible: bool) {
        self.flexible.insert(key, flexible);
    }

    pub fn is_flexible(&self, key: &ElementKey) -> bool {
        self.flexible.get(key).copied().unwrap_or(false)
    }

    pub fn flexible_count(&self) -> usize {
        self.flexible.values().filter(|f| **f).count()
    }

    pub fn len(&self) -> usize {
        self.flexible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flexible.is_empty()
    }

    /// Drops entries of elements that are not part of `sections`.
    pub fn prune(&mut self, sections: &[Section]) {
        let live: IndexMap<&Identity, &Section> = sections.iter().map(|s| (&s.id, s)).collect();
        self.flexible.retain(|key, _| {
            live.get(&key.section).is_some_and(|section| match &key.element {
                ElementRef::Header => section.header.is_some(),
                ElementRef::Footer => section.footer.is_some(),
                ElementRef::Row(id) => section.rows.iter().any(|b| b.id() == id),
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn row(section: usize, row: usize) -> ElementSlot {
        ElementSlot::Row(Position::new(section, row))
    }

    fn viewport(height: f64) -> Viewport {
        Viewport {
            height,
            top_chrome: 0.0,
            bottom_inset: 0.0,
        }
    }

    #[test]
    fn blank_space_is_shared_evenly() {
        let elements = [
            MeasuredElement::fixed(row(0, 0), 100.0),
            MeasuredElement::flexible(row(0, 1)),
            MeasuredElement::fixed(row(0, 2), 100.0),
            MeasuredElement::flexible(row(0, 3)),
        ];
        let layout = solve(viewport(800.0), &elements, SolverOptions::default());
        assert_eq!(layout.available_space, 600.0);
        assert_eq!(layout.assignments, vec![(row(0, 1), 300.0), (row(0, 3), 300.0)]);
        assert_eq!(layout.total_assigned() + 200.0, 800.0);
    }

    #[test]
    fn chrome_and_inset_are_consumed() {
        let elements = [MeasuredElement::flexible(ElementSlot::Footer(0))];
        let view = Viewport {
            height: 800.0,
            top_chrome: 91.0,
            bottom_inset: 34.0,
        };
        let layout = solve(view, &elements, SolverOptions::default());
        assert_eq!(layout.consumed, 125.0);
        assert_eq!(layout.per_element_height, Some(675.0));
    }

    #[test]
    fn overflowing_content_falls_back_to_the_floor() {
        let elements = [
            MeasuredElement::fixed(row(0, 0), 900.0),
            MeasuredElement::flexible(row(0, 1)),
        ];
        let layout = solve(viewport(800.0), &elements, SolverOptions::default());
        assert_eq!(layout.available_space, -100.0);
        assert_eq!(layout.per_element_height, Some(DEFAULT_MINIMUM_FLEXIBLE_HEIGHT));
    }

    #[test]
    fn no_flexible_elements_assigns_nothing() {
        let elements = [MeasuredElement::fixed(row(0, 0), 10.0)];
        let layout = solve(viewport(800.0), &elements, SolverOptions::default());
        assert!(layout.assignments.is_empty());
        assert_eq!(layout.per_element_height, None);
    }

    #[test]
    fn heights_snap_down_to_the_pixel_grid() {
        let elements = [
            MeasuredElement::flexible(row(0, 0)),
            MeasuredElement::flexible(row(0, 1)),
            MeasuredElement::flexible(row(0, 2)),
        ];
        let options = SolverOptions {
            pixel_scale: Some(2.0),
            ..SolverOptions::default()
        };
        let layout = solve(viewport(100.0), &elements, options);
        assert_eq!(layout.per_element_height, Some(33.0));
    }

    #[test]
    fn solving_twice_gives_the_same_heights() {
        let elements = [
            MeasuredElement::fixed(ElementSlot::Header(0), 44.0),
            MeasuredElement::flexible(row(0, 0)),
        ];
        let first = solve(viewport(667.0), &elements, SolverOptions::default());
        let second = solve(viewport(667.0), &elements, SolverOptions::default());
        assert_eq!(first, second);
    }
}

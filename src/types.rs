//! Plain value types shared by the diff engine, the renderer and the layout solver
use serde::{Deserialize, Serialize};
use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable key of a section or an item.
///
/// Identities are compared structurally and never by content; two values with the
/// same identity are two versions of one logical entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Int(i64),
    Str(String),
    Uuid(Uuid),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Int(v) => write!(f, "{}", v),
            Identity::Str(v) => f.write_str(v),
            Identity::Uuid(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Identity {
    fn from(value: i64) -> Self {
        Identity::Int(value)
    }
}

impl From<i32> for Identity {
    fn from(value: i32) -> Self {
        Identity::Int(value.into())
    }
}

impl From<u32> for Identity {
    fn from(value: u32) -> Self {
        Identity::Int(value.into())
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity::Str(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Identity::Str(value)
    }
}

impl From<&String> for Identity {
    fn from(value: &String) -> Self {
        Identity::Str(value.clone())
    }
}

impl From<Uuid> for Identity {
    fn from(value: Uuid) -> Self {
        Identity::Uuid(value)
    }
}

/// The list in which an identity must be unique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityScope {
    Sections,
    Rows { section: Identity },
}

impl fmt::Display for IdentityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityScope::Sections => f.write_str("the section list"),
            IdentityScope::Rows { section } => write!(f, "the rows of section '{}'", section),
        }
    }
}

/// Index path of a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub section: usize,
    pub row: usize,
}

impl Position {
    pub fn new(section: usize, row: usize) -> Self {
        Position { section, row }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.row)
    }
}

/// A renderable slot of the list, addressed by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ElementSlot {
    Header(usize),
    Footer(usize),
    Row(Position),
}

impl ElementSlot {
    pub fn section(&self) -> usize {
        match self {
            ElementSlot::Header(section) | ElementSlot::Footer(section) => *section,
            ElementSlot::Row(position) => position.section,
        }
    }
}

impl fmt::Display for ElementSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementSlot::Header(section) => write!(f, "the header of section {}", section),
            ElementSlot::Footer(section) => write!(f, "the footer of section {}", section),
            ElementSlot::Row(position) => write!(f, "row {}", position),
        }
    }
}

/// Move-stable address of an element: survives index shifts caused by inserts,
/// deletes and moves, unlike [`ElementSlot`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementKey {
    pub section: Identity,
    pub element: ElementRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Header,
    Footer,
    Row(Identity),
}

/// Animation requested for a batch of list mutations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStyle {
    /// Applied inside a no-animation scope.
    None,
    Fade,
    Right,
    Left,
    Top,
    Bottom,
    Middle,
    #[default]
    Automatic,
}

impl AnimationStyle {
    pub fn is_animated(&self) -> bool {
        !matches!(self, AnimationStyle::None)
    }
}

/// Height answer for the widget's sizing callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dimension {
    /// Let the widget size the element from its own layout.
    Automatic,
    Points(f64),
}

impl Dimension {
    /// Smallest positive height; the widget treats it as "collapsed but present".
    pub const LEAST: Dimension = Dimension::Points(f64::MIN_POSITIVE);
}

/// Geometry of the list's viewport for one layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub height: f64,
    /// Status bar plus navigation bar.
    pub top_chrome: f64,
    /// Bottom safe-area inset.
    pub bottom_inset: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }
}

/// Runtime type key of a component, resolved once per registration.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Relocation of one section or row, from its old index to its new index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

/// A matched row whose content changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RowUpdate {
    pub old: usize,
    pub new: usize,
}

/// Header and/or footer of a matched section that must be reconfigured in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SupplementaryUpdate {
    /// Index in the new list.
    pub section: usize,
    pub header: bool,
    pub footer: bool,
}

/// Row operations of one section present in both lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SectionRowChanges {
    pub old_section: usize,
    pub new_section: usize,
    /// Old row indices.
    pub deleted: Vec<usize>,
    /// New row indices.
    pub inserted: Vec<usize>,
    pub moved: Vec<Move>,
    pub updated: Vec<RowUpdate>,
}

impl SectionRowChanges {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
            && self.inserted.is_empty()
            && self.moved.is_empty()
            && self.updated.is_empty()
    }
}

/// Output of the diff engine.
///
/// Deletes are indices into the old list, inserts indices into the new list. Moves
/// carry both. Row changes are grouped per matched section and only present when
/// non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EditScript {
    pub deleted_sections: Vec<usize>,
    pub inserted_sections: Vec<usize>,
    pub moved_sections: Vec<Move>,
    pub supplementaries: Vec<SupplementaryUpdate>,
    pub rows: Vec<SectionRowChanges>,
}

impl EditScript {
    pub fn is_empty(&self) -> bool {
        self.deleted_sections.is_empty()
            && self.inserted_sections.is_empty()
            && self.moved_sections.is_empty()
            && self.supplementaries.is_empty()
            && self.rows.is_empty()
    }

    /// Row changes of the section found at `new_section` in the new list.
    pub fn rows_of(&self, new_section: usize) -> Option<&SectionRowChanges> {
        self.rows.iter().find(|r| r.new_section == new_section)
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats {
            section_deletes: self.deleted_sections.len(),
            section_inserts: self.inserted_sections.len(),
            section_moves: self.moved_sections.len(),
            supplementary_updates: self.supplementaries.len(),
            ..DiffStats::default()
        };
        for rows in &self.rows {
            stats.row_deletes += rows.deleted.len();
            stats.row_inserts += rows.inserted.len();
            stats.row_moves += rows.moved.len();
            stats.row_updates += rows.updated.len();
        }
        stats
    }
}

/// Operation counts of an [`EditScript`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub section_deletes: usize,
    pub section_inserts: usize,
    pub section_moves: usize,
    pub supplementary_updates: usize,
    pub row_deletes: usize,
    pub row_inserts: usize,
    pub row_moves: usize,
    pub row_updates: usize,
}

/// One native list mutation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetMutation {
    /// Old section indices.
    DeleteSections { sections: Vec<usize> },
    /// New section indices.
    InsertSections { sections: Vec<usize> },
    MoveSection { from: usize, to: usize },
    /// Old positions.
    DeleteRows { positions: Vec<Position> },
    /// New positions.
    InsertRows { positions: Vec<Position> },
    MoveRow { from: Position, to: Position },
    /// New positions; the widget re-configures the existing views in place.
    ReconfigureRows { positions: Vec<Position> },
    ReconfigureHeader { section: usize },
    ReconfigureFooter { section: usize },
}

/// Mutations the widget must apply as one batch update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MutationBatch {
    pub animation: AnimationStyle,
    pub mutations: Vec<WidgetMutation>,
}

impl MutationBatch {
    /// `false` means the batch must run inside a no-animation scope.
    pub fn is_animated(&self) -> bool {
        self.animation.is_animated()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

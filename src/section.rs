//! Sections and identity-uniqueness validation
use crate::component::{Block, IntoBlock};
use crate::errors::BlocksError;
use crate::types::{ElementKey, ElementRef, ElementSlot, Identity, IdentityScope, Position};
use indexmap::IndexMap;

/// An ordered group of rows with an optional header and footer.
///
/// Two sections with the same identity are the same section, even when their
/// header, footer or rows differ.
#[derive(Clone, Debug)]
pub struct Section {
    pub id: Identity,
    pub header: Option<Block>,
    pub footer: Option<Block>,
    pub rows: Vec<Block>,
}

impl Section {
    pub fn new(id: impl Into<Identity>) -> Self {
        Section {
            id: id.into(),
            header: None,
            footer: None,
            rows: Vec::new(),
        }
    }

    pub fn with_header(mut self, header: impl IntoBlock) -> Self {
        self.header = Some(header.into_block());
        self
    }

    pub fn with_footer(mut self, footer: impl IntoBlock) -> Self {
        self.footer = Some(footer.into_block());
        self
    }

    pub fn with_rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoBlock,
    {
        self.rows = rows.into_iter().map(IntoBlock::into_block).collect();
        self
    }

    pub fn row(&self, index: usize) -> Option<&Block> {
        self.rows.get(index)
    }

    /// Header and footer are equal in presence, type and content.
    pub fn supplementaries_equal(&self, other: &Section) -> bool {
        optional_equal(&self.header, &other.header) && optional_equal(&self.footer, &other.footer)
    }

    /// Checks that no two rows share an identity.
    pub fn validate(&self) -> Result<(), BlocksError> {
        unique_index(
            self.rows.iter().map(Block::id),
            || IdentityScope::Rows {
                section: self.id.clone(),
            },
        )
        .map(|_| ())
    }
}

pub(crate) fn optional_equal(old: &Option<Block>, new: &Option<Block>) -> bool {
    match (old, new) {
        (None, None) => true,
        (Some(old), Some(new)) => old.id() == new.id() && old.is_content_equal(new),
        _ => false,
    }
}

/// Builds an identity → index lookup, failing on the first repeated identity.
pub(crate) fn unique_index<'a, I>(
    identities: I,
    scope: impl FnOnce() -> IdentityScope,
) -> Result<IndexMap<&'a Identity, usize>, BlocksError>
where
    I: IntoIterator<Item = &'a Identity>,
{
    let mut index = IndexMap::new();
    for (position, identity) in identities.into_iter().enumerate() {
        if let (_, Some(first)) = index.insert_full(identity, position) {
            return Err(BlocksError::DuplicateIdentity {
                identity: identity.clone(),
                scope: scope(),
                first,
                second: position,
            });
        }
    }
    Ok(index)
}

/// Checks section identities and the row identities of every section.
pub fn validate_sections(sections: &[Section]) -> Result<(), BlocksError> {
    unique_index(sections.iter().map(|s| &s.id), || IdentityScope::Sections)?;
    sections.iter().try_for_each(Section::validate)
}

/// Resolves an index slot to the block behind it.
pub fn block_at(sections: &[Section], slot: ElementSlot) -> Option<&Block> {
    match slot {
        ElementSlot::Header(section) => sections.get(section)?.header.as_ref(),
        ElementSlot::Footer(section) => sections.get(section)?.footer.as_ref(),
        ElementSlot::Row(Position { section, row }) => sections.get(section)?.row(row),
    }
}

/// Resolves an index slot to its move-stable key.
pub fn element_key(sections: &[Section], slot: ElementSlot) -> Option<ElementKey> {
    let section = sections.get(slot.section())?;
    let element = match slot {
        ElementSlot::Header(_) => ElementRef::Header,
        ElementSlot::Footer(_) => ElementRef::Footer,
        ElementSlot::Row(position) => ElementRef::Row(section.rows.get(position.row)?.id().clone()),
    };
    Some(ElementKey {
        section: section.id.clone(),
        element,
    })
}

/// Finds the current position of a row by identity.
pub fn find_row(sections: &[Section], section_id: &Identity, row_id: &Identity) -> Option<Position> {
    let section = sections.iter().position(|s| &s.id == section_id)?;
    let row = sections[section].rows.iter().position(|b| b.id() == row_id)?;
    Some(Position::new(section, row))
}

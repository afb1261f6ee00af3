//! Two-level keyed diff: sections by identity, then the rows of every matched section
use crate::component::Block;
use crate::errors::BlocksError;
use crate::section::{optional_equal, unique_index, validate_sections, Section};
use crate::types::*;
use indexmap::IndexMap;
use log::{debug, trace};

/// Computes the edit script turning `old` into `new`.
///
/// `new` is always validated for duplicate identities. Identical lists are detected
/// with a single linear pass and produce an empty script.
pub fn diff(old: &[Section], new: &[Section]) -> Result<EditScript, BlocksError> {
    validate_sections(new)?;

    if is_identical(old, new) {
        trace!("DiffEngine: lists are identical ({} sections)", new.len());
        return Ok(EditScript::default());
    }

    let mut script = EditScript::default();
    DiffEngine::new(old, new, &mut script).reconcile()?;
    debug!("DiffEngine: {:?}", script.stats());
    Ok(script)
}

/// Same section identities in the same order, equal supplementaries, and the same
/// rows with equal content.
pub fn is_identical(old: &[Section], new: &[Section]) -> bool {
    old.len() == new.len()
        && old.iter().zip(new).all(|(o, n)| {
            o.id == n.id
                && o.rows.len() == n.rows.len()
                && o.supplementaries_equal(n)
                && o.rows.iter().zip(&n.rows).all(|(a, b)| a.id() == b.id() && a.is_content_equal(b))
        })
}

pub struct DiffEngine<'a> {
    old: &'a [Section],
    new: &'a [Section],
    result: &'a mut EditScript,
}

impl<'a> DiffEngine<'a> {
    pub fn new(old: &'a [Section], new: &'a [Section], result: &'a mut EditScript) -> Self {
        DiffEngine { old, new, result }
    }

    pub fn reconcile(&mut self) -> Result<(), BlocksError> {
        let old_index = unique_index(self.old.iter().map(|s| &s.id), || IdentityScope::Sections)?;
        let new_ids: Vec<&Identity> = self.new.iter().map(|s| &s.id).collect();
        let matching = KeyedMatch::compute(&old_index, &new_ids, self.old.len());

        self.result.deleted_sections = matching.deleted.clone();
        self.result.inserted_sections = matching.inserted.clone();
        self.result.moved_sections = matching.moves();

        for &(old_idx, new_idx) in &matching.pairs {
            self.diff_section(old_idx, new_idx)?;
        }
        Ok(())
    }

    fn diff_section(&mut self, old_idx: usize, new_idx: usize) -> Result<(), BlocksError> {
        let old = &self.old[old_idx];
        let new = &self.new[new_idx];

        let header = !optional_equal(&old.header, &new.header);
        let footer = !optional_equal(&old.footer, &new.footer);
        if header || footer {
            self.result.supplementaries.push(SupplementaryUpdate {
                section: new_idx,
                header,
                footer,
            });
        }

        let rows = diff_rows(old, new, old_idx, new_idx)?;
        if !rows.is_empty() {
            trace!(
                "DiffEngine: section '{}' rows: {} deleted, {} inserted, {} moved, {} updated",
                new.id,
                rows.deleted.len(),
                rows.inserted.len(),
                rows.moved.len(),
                rows.updated.len()
            );
            self.result.rows.push(rows);
        }
        Ok(())
    }
}

fn diff_rows(
    old: &Section,
    new: &Section,
    old_section: usize,
    new_section: usize,
) -> Result<SectionRowChanges, BlocksError> {
    let mut changes = SectionRowChanges {
        old_section,
        new_section,
        ..SectionRowChanges::default()
    };
    if old.rows.is_empty() && new.rows.is_empty() {
        return Ok(changes);
    }

    let old_index = unique_index(old.rows.iter().map(Block::id), || IdentityScope::Rows {
        section: old.id.clone(),
    })?;
    let new_ids: Vec<&Identity> = new.rows.iter().map(Block::id).collect();
    let matching = KeyedMatch::compute(&old_index, &new_ids, old.rows.len());

    changes.moved = matching.moves();
    changes.updated = matching
        .pairs
        .iter()
        .filter(|&&(o, n)| !old.rows[o].is_content_equal(&new.rows[n]))
        .map(|&(o, n)| RowUpdate { old: o, new: n })
        .collect();
    changes.deleted = matching.deleted;
    changes.inserted = matching.inserted;
    Ok(changes)
}

/// Identity matching between two sequences.
///
/// Matched pairs whose old indices form the longest increasing subsequence keep
/// their relative order and stay in place; every other pair is a move. This keeps
/// the number of moves minimal.
#[derive(Debug, Default)]
pub(crate) struct KeyedMatch {
    pub deleted: Vec<usize>,
    pub inserted: Vec<usize>,
    /// `(old, new)` in new order.
    pub pairs: Vec<(usize, usize)>,
    /// Per pair: part of the longest increasing subsequence.
    pub stationary: Vec<bool>,
}

impl KeyedMatch {
    pub fn compute(
        old_index: &IndexMap<&Identity, usize>,
        new_ids: &[&Identity],
        old_len: usize,
    ) -> Self {
        let mut matched_old = vec![false; old_len];
        let mut result = KeyedMatch::default();

        for (new_idx, id) in new_ids.iter().enumerate() {
            match old_index.get(id) {
                Some(&old_idx) => {
                    matched_old[old_idx] = true;
                    result.pairs.push((old_idx, new_idx));
                }
                None => result.inserted.push(new_idx),
            }
        }
        result.deleted = matched_old
            .iter()
            .enumerate()
            .filter(|(_, matched)| !**matched)
            .map(|(i, _)| i)
            .collect();

        let sequence: Vec<usize> = result.pairs.iter().map(|&(old_idx, _)| old_idx).collect();
        result.stationary = vec![false; sequence.len()];
        if !sequence.is_empty() {
            for i in lis::longest_increasing_subsequence(&sequence) {
                result.stationary[i] = true;
            }
        }
        result
    }

    pub fn moves(&self) -> Vec<Move> {
        self.pairs
            .iter()
            .zip(&self.stationary)
            .filter(|(_, stationary)| !**stationary)
            .map(|(&(from, to), _)| Move { from, to })
            .collect()
    }
}

//! Conversion of edit scripts into ordered widget mutation batches
use crate::errors::BlocksError;
use crate::types::*;

/// Convert an edit script into the batches the widget must apply, in order.
///
/// The first batch changes structure: deletes are expressed against the list before
/// the batch and listed first (highest index first), inserts against the list after
/// the batch (lowest index first), then moves. The second batch, present only when
/// needed, reconfigures matched rows and section headers/footers in place at their
/// new indices. Reconfiguration never shares a batch with a move of the same row.
pub fn batches_for(script: &EditScript, animation: AnimationStyle) -> Vec<MutationBatch> {
    [structural_mutations(script), reconfigure_mutations(script)]
        .into_iter()
        .filter(|mutations| !mutations.is_empty())
        .map(|mutations| MutationBatch {
            animation,
            mutations,
        })
        .collect()
}

fn structural_mutations(script: &EditScript) -> Vec<WidgetMutation> {
    let mut mutations = Vec::new();

    if !script.deleted_sections.is_empty() {
        let mut sections = script.deleted_sections.clone();
        sections.sort_unstable_by(|a, b| b.cmp(a));
        mutations.push(WidgetMutation::DeleteSections { sections });
    }
    if !script.inserted_sections.is_empty() {
        let mut sections = script.inserted_sections.clone();
        sections.sort_unstable();
        mutations.push(WidgetMutation::InsertSections { sections });
    }
    mutations.extend(
        script
            .moved_sections
            .iter()
            .map(|m| WidgetMutation::MoveSection { from: m.from, to: m.to }),
    );

    let mut deleted: Vec<Position> = script
        .rows
        .iter()
        .flat_map(|r| r.deleted.iter().map(move |&row| Position::new(r.old_section, row)))
        .collect();
    if !deleted.is_empty() {
        deleted.sort_unstable_by(|a, b| b.cmp(a));
        mutations.push(WidgetMutation::DeleteRows { positions: deleted });
    }

    let mut inserted: Vec<Position> = script
        .rows
        .iter()
        .flat_map(|r| r.inserted.iter().map(move |&row| Position::new(r.new_section, row)))
        .collect();
    if !inserted.is_empty() {
        inserted.sort_unstable();
        mutations.push(WidgetMutation::InsertRows { positions: inserted });
    }

    for rows in &script.rows {
        mutations.extend(rows.moved.iter().map(|m| WidgetMutation::MoveRow {
            from: Position::new(rows.old_section, m.from),
            to: Position::new(rows.new_section, m.to),
        }));
    }
    mutations
}

fn reconfigure_mutations(script: &EditScript) -> Vec<WidgetMutation> {
    let mut mutations = Vec::new();

    let mut positions: Vec<Position> = script
        .rows
        .iter()
        .flat_map(|r| r.updated.iter().map(move |u| Position::new(r.new_section, u.new)))
        .collect();
    if !positions.is_empty() {
        positions.sort_unstable();
        mutations.push(WidgetMutation::ReconfigureRows { positions });
    }

    for update in &script.supplementaries {
        if update.header {
            mutations.push(WidgetMutation::ReconfigureHeader {
                section: update.section,
            });
        }
        if update.footer {
            mutations.push(WidgetMutation::ReconfigureFooter {
                section: update.section,
            });
        }
    }
    mutations
}

/// Serialize batches for structured logs.
pub fn batches_to_json(batches: &[MutationBatch]) -> Result<String, BlocksError> {
    Ok(serde_json::to_string(batches)?)
}

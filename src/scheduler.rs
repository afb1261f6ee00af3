//! Tasks that run on the next idle turn, after the current frame
use crate::drag_drop::PendingDrop;
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub enum DeferredTask {
    /// Distribute blank viewport space among flexible elements.
    ExpandFlexible { animated: bool },
    /// Insert half of a two-phase drop.
    CompleteDrop(PendingDrop),
}

/// FIFO queue of deferred tasks.
///
/// Flexible-height passes are coalesced: while one is queued, further requests
/// only widen its animation flag.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: VecDeque<DeferredTask>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task`. Returns `true` when the queue was empty, meaning the caller
    /// must request an idle turn from the widget.
    pub fn push(&mut self, task: DeferredTask) -> bool {
        if let DeferredTask::ExpandFlexible { animated } = task {
            let queued = self.tasks.iter_mut().find_map(|t| match t {
                DeferredTask::ExpandFlexible { animated } => Some(animated),
                _ => None,
            });
            if let Some(queued) = queued {
                *queued |= animated;
                return false;
            }
        }
        let was_empty = self.tasks.is_empty();
        self.tasks.push_back(task);
        was_empty
    }

    /// Removes every queued task. Tasks queued while these run wait for the next turn.
    pub fn take(&mut self) -> Vec<DeferredTask> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

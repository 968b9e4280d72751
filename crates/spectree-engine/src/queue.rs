//! The Spec task queue: a singly-linked list with three insertion
//! disciplines (enqueue/defer/push) and three cursors (head, enqueue-end,
//! push queue) (spec.md Section 4.1).
//!
//! Expressed as an arena (`Vec<QueueNode>`) addressed by index rather than
//! an intrusively-linked list of boxed nodes, for the same reason the
//! TaskResolver tree is arena-indexed (spec.md Section 9 REDESIGN FLAGS).

use spectree_task::Task;

struct QueueNode {
    task: Task,
    next: Option<usize>,
}

/// Index of a task within a [`TaskQueue`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskIndex(usize);

/// A Spec's task list plus its three insertion cursors and transient push
/// list (spec.md Section 4.1).
#[derive(Default)]
pub struct TaskQueue {
    arena: Vec<QueueNode>,
    head: Option<usize>,
    enqueue_end: Option<usize>,
    /// Tracks the most recently deferred task, so consecutive `defer`
    /// calls chain after each other (preserving relative order) rather
    /// than all piling up right after `enqueue_end` (spec.md Section 4.1:
    /// "Multiple defers preserve relative order").
    defer_tail: Option<usize>,
    push_queue: Vec<usize>,
    current: Option<usize>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Appends at the enqueue-end, advancing it (spec.md Section 4.1
    /// "Enqueue"). Returns the new task's index.
    pub fn enqueue(&mut self, task: Task) -> TaskIndex {
        let idx = self.push_node(task, None);
        match (self.head, self.enqueue_end) {
            (None, _) => {
                self.head = Some(idx);
                self.enqueue_end = Some(idx);
            }
            (Some(_), Some(end)) => {
                self.arena[idx].next = self.arena[end].next;
                self.arena[end].next = Some(idx);
                self.enqueue_end = Some(idx);
            }
            (Some(head), None) => {
                // A defer already established the head without setting
                // enqueue_end; this enqueue inserts before it.
                self.arena[idx].next = Some(head);
                self.head = Some(idx);
                self.enqueue_end = Some(idx);
            }
        }
        TaskIndex(idx)
    }

    /// Inserts directly after the enqueue-end without advancing it
    /// (spec.md Section 4.1 "Defer"). When the queue is empty, establishes
    /// the head without setting the enqueue-end.
    pub fn defer(&mut self, task: Task) -> TaskIndex {
        let idx = self.push_node(task, None);
        // Prefer chaining after the most recently deferred task (if any)
        // so consecutive defers preserve relative order even across an
        // intervening enqueue, which always splices itself *before* the
        // existing deferred chain rather than after it.
        let insertion_point = self.defer_tail.or(self.enqueue_end);
        match insertion_point {
            Some(point) => {
                self.arena[idx].next = self.arena[point].next;
                self.arena[point].next = Some(idx);
            }
            None => {
                self.head = Some(idx);
            }
        }
        self.defer_tail = Some(idx);
        TaskIndex(idx)
    }

    /// Appends to the transient push queue. Flushed into the main list
    /// immediately after the current task on the next `prime`/`advance`
    /// call (spec.md Section 4.1 "Push").
    pub fn push(&mut self, task: Task) -> TaskIndex {
        let idx = self.push_node(task, None);
        self.push_queue.push(idx);
        TaskIndex(idx)
    }

    fn push_node(&mut self, task: Task, next: Option<usize>) -> usize {
        self.arena.push(QueueNode { task, next });
        self.arena.len() - 1
    }

    /// Splices the pending push queue into the main list immediately after
    /// `current` (or at the head if there is no current task).
    fn flush_push(&mut self) {
        if self.push_queue.is_empty() {
            return;
        }
        let chain: Vec<usize> = std::mem::take(&mut self.push_queue);
        for window in chain.windows(2) {
            self.arena[window[0]].next = Some(window[1]);
        }
        let first = chain[0];
        let last = *chain.last().expect("chain is non-empty");
        match self.current {
            Some(current) => {
                self.arena[last].next = self.arena[current].next;
                self.arena[current].next = Some(first);
            }
            None => {
                self.arena[last].next = self.head;
                self.head = Some(first);
            }
        }
    }

    /// Flushes the push queue and points the current-task cursor at the
    /// head (spec.md Section 4.6 step 3, run-loop entry).
    pub fn prime(&mut self) {
        self.flush_push();
        self.current = self.head;
    }

    /// Flushes the push queue and advances the current-task cursor (spec.md
    /// Section 4.6 step 4, after every task).
    pub fn advance(&mut self) {
        self.flush_push();
        self.current = self.current.and_then(|c| self.arena[c].next);
    }

    pub fn current_index(&self) -> Option<TaskIndex> {
        self.current.map(TaskIndex)
    }

    pub fn task(&self, idx: TaskIndex) -> &Task {
        &self.arena[idx.0].task
    }

    pub fn task_mut(&mut self, idx: TaskIndex) -> &mut Task {
        &mut self.arena[idx.0].task
    }

    /// Indices of every task strictly after `start` (exclusive), in list
    /// order — used by `EmitAsset`'s forward scan for the next task that
    /// can receive assets (spec.md Section 4.4 step 2). `start = None`
    /// scans from the head.
    pub fn indices_after(&self, start: Option<TaskIndex>) -> Vec<TaskIndex> {
        let mut out = Vec::new();
        let mut cursor = match start {
            Some(idx) => self.arena[idx.0].next,
            None => self.head,
        };
        while let Some(i) = cursor {
            out.push(TaskIndex(i));
            cursor = self.arena[i].next;
        }
        out
    }

    /// Finds the first task strictly after `start` (or from the head, if
    /// `start` is `None`) satisfying `predicate`, without collecting the
    /// whole forward run into a `Vec` first — used by `EmitAsset`'s forward
    /// scan for the next task that can receive assets (spec.md Section 4.4
    /// step 2).
    pub fn find_after(
        &self,
        start: Option<TaskIndex>,
        mut predicate: impl FnMut(&Task) -> bool,
    ) -> Option<TaskIndex> {
        let mut cursor = match start {
            Some(idx) => self.arena[idx.0].next,
            None => self.head,
        };
        while let Some(i) = cursor {
            if predicate(&self.arena[i].task) {
                return Some(TaskIndex(i));
            }
            cursor = self.arena[i].next;
        }
        None
    }

    /// Detects a cycle in the main list via a visited-set walk from the
    /// head (spec.md Section 9: "detected via a set traversal at the start
    /// of each Run iteration").
    pub fn has_cycle(&self) -> bool {
        let mut seen = vec![false; self.arena.len()];
        let mut cursor = self.head;
        while let Some(i) = cursor {
            if seen[i] {
                return true;
            }
            seen[i] = true;
            cursor = self.arena[i].next;
        }
        false
    }

    /// All tasks in list order, draining the arena. Used once the queue
    /// has fully drained and ownership of remaining tasks is no longer
    /// needed by the run loop (e.g. for diagnostics/tree dumps).
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.head;
        while let Some(i) = cursor {
            count += 1;
            cursor = self.arena[i].next;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_task::{CapabilityMask, TaskBehavior, TaskContext};

    struct Noop(&'static str);
    impl TaskBehavior for Noop {
        fn has_func(&self) -> bool {
            true
        }
        fn has_map_func(&self) -> bool {
            false
        }
    }

    fn task(name: &'static str) -> Task {
        Task::new(name, CapabilityMask::NONE, Box::new(Noop(name))).unwrap()
    }

    fn names(queue: &mut TaskQueue) -> Vec<String> {
        let mut out = Vec::new();
        queue.prime();
        while let Some(idx) = queue.current_index() {
            out.push(queue.task(idx).name.clone());
            queue.advance();
        }
        out
    }

    #[test]
    fn enqueue_produces_fifo_order() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        queue.enqueue(task("c"));
        assert_eq!(names(&mut queue), vec!["a", "b", "c"]);
    }

    #[test]
    fn deferred_tasks_run_after_all_enqueued() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.defer(task("deferred-1"));
        queue.enqueue(task("b"));
        queue.defer(task("deferred-2"));
        assert_eq!(
            names(&mut queue),
            vec!["a", "b", "deferred-1", "deferred-2"]
        );
    }

    #[test]
    fn defer_on_empty_queue_establishes_head_not_enqueue_end() {
        let mut queue = TaskQueue::new();
        queue.defer(task("deferred"));
        queue.enqueue(task("enqueued"));
        assert_eq!(names(&mut queue), vec!["enqueued", "deferred"]);
    }

    #[test]
    fn push_runs_immediately_after_current_task() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        queue.prime();
        assert_eq!(queue.task(queue.current_index().unwrap()).name, "a");
        queue.push(task("pushed"));
        queue.advance();
        assert_eq!(queue.task(queue.current_index().unwrap()).name, "pushed");
        queue.advance();
        assert_eq!(queue.task(queue.current_index().unwrap()).name, "b");
    }

    #[test]
    fn push_before_any_task_runs_flushes_to_head() {
        let mut queue = TaskQueue::new();
        queue.push(task("pushed"));
        queue.enqueue(task("a"));
        assert_eq!(names(&mut queue), vec!["pushed", "a"]);
    }

    #[test]
    fn acyclic_queue_reports_no_cycle() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        assert!(!queue.has_cycle());
    }

    #[test]
    fn indices_after_scans_forward_from_a_task() {
        let mut queue = TaskQueue::new();
        let a = queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        queue.enqueue(task("c"));
        let after = queue.indices_after(Some(a));
        assert_eq!(after.len(), 2);
        assert_eq!(queue.task(after[0]).name, "b");
    }

    #[test]
    fn indices_after_none_scans_from_head() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.enqueue(task("b"));
        let after = queue.indices_after(None);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn len_counts_main_list_not_pending_pushes() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.push(task("pending"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn suite_of_defers_preserves_relative_order_among_themselves() {
        let mut queue = TaskQueue::new();
        queue.enqueue(task("a"));
        queue.defer(task("d1"));
        queue.defer(task("d2"));
        queue.defer(task("d3"));
        assert_eq!(names(&mut queue), vec!["a", "d1", "d2", "d3"]);
    }

    // Property tests for spec.md Section 8 invariants 1 and 2: "for any
    // sequence of enqueue/defer/push operations, the resulting task list is
    // acyclic" and "execution order of enqueued tasks matches insertion
    // order; deferred tasks run after all enqueued tasks".
    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn task_n(id: usize) -> Task {
            Task::new(format!("t{id}"), CapabilityMask::NONE, Box::new(Noop("t"))).unwrap()
        }

        proptest! {
            #[test]
            fn arbitrary_enqueue_defer_push_sequences_stay_acyclic(
                ops in proptest::collection::vec(0u8..3, 0..60)
            ) {
                let mut queue = TaskQueue::new();
                for (i, op) in ops.iter().enumerate() {
                    match op {
                        0 => { queue.enqueue(task_n(i)); }
                        1 => { queue.defer(task_n(i)); }
                        _ => { queue.push(task_n(i)); }
                    }
                }
                prop_assert!(!queue.has_cycle());
            }

            #[test]
            fn enqueued_tasks_precede_deferred_tasks_each_in_insertion_order(
                enqueue_count in 0usize..12,
                defer_count in 0usize..12,
            ) {
                let mut queue = TaskQueue::new();
                for i in 0..enqueue_count {
                    queue.enqueue(task_n(i));
                }
                for i in 0..defer_count {
                    queue.defer(task_n(1000 + i));
                }
                let order = names(&mut queue);
                let expected_enqueued: Vec<String> = (0..enqueue_count).map(|i| format!("t{i}")).collect();
                let expected_deferred: Vec<String> =
                    (0..defer_count).map(|i| format!("t{}", 1000 + i)).collect();
                prop_assert_eq!(&order[..enqueue_count], &expected_enqueued[..]);
                prop_assert_eq!(&order[enqueue_count..], &expected_deferred[..]);
            }
        }
    }
}

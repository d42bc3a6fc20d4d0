//! The pending sync queue.
//!
//! An in-memory ordered collection of sync items with bounded admission.
//! The engine mirrors every mutation to the snapshot store so a crash or
//! reload never loses queued work.

use learnsync_model::{SyncItem, SyncPriority, SyncStrategies};
use uuid::Uuid;

/// Bounded, priority-ordered collection of pending sync items.
///
/// # Overflow policy
///
/// Admission is lossy under pressure by design: at capacity, the tail of a
/// priority-sorted view is evicted to make room - the lowest-priority item,
/// newest first among equals. A `critical` item is therefore never evicted
/// while any lower-priority item exists.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    items: Vec<SyncItem>,
    max_size: usize,
}

impl SyncQueue {
    /// Creates an empty queue with the given admission bound.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Number of pending items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items are pending.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if an item with the given id is pending.
    pub fn contains(&self, id: Uuid) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    /// The pending items, in insertion order.
    pub fn items(&self) -> &[SyncItem] {
        &self.items
    }

    /// Admits an item, evicting the lowest-priority entry if over capacity.
    ///
    /// Returns the evicted item, if any. The evicted item may be the one
    /// just admitted when it is itself the lowest-priority entry.
    pub fn push(&mut self, item: SyncItem) -> Option<SyncItem> {
        self.items.push(item);
        if self.items.len() <= self.max_size {
            return None;
        }

        // Tail of the priority-sorted view: lowest band, newest within it.
        let evict_index = self
            .items
            .iter()
            .enumerate()
            .max_by_key(|(_, i)| (i.priority, i.enqueued_at_ms))
            .map(|(index, _)| index)?;
        Some(self.items.remove(evict_index))
    }

    /// Removes a pending item by id.
    pub fn remove(&mut self, id: Uuid) -> Option<SyncItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    /// Discards all pending items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replaces the queue contents from a restored snapshot.
    pub fn restore(&mut self, items: Vec<SyncItem>) {
        self.items = items;
        while self.items.len() > self.max_size {
            self.push_evict_only();
        }
    }

    fn push_evict_only(&mut self) {
        if let Some(index) = self
            .items
            .iter()
            .enumerate()
            .max_by_key(|(_, i)| (i.priority, i.enqueued_at_ms))
            .map(|(index, _)| index)
        {
            self.items.remove(index);
        }
    }

    /// Returns true if any pending item could be admitted to a batch:
    /// a `critical` item, or one whose type's strategy is enabled.
    pub fn has_dispatchable(&self, strategies: &SyncStrategies) -> bool {
        self.items.iter().any(|i| {
            i.priority == SyncPriority::Critical || strategies.for_type(i.sync_type).enabled
        })
    }

    /// Selects and removes the next dispatch batch.
    ///
    /// Selection order:
    /// 1. Sort by priority band, then enqueue time (FIFO within a band).
    /// 2. Admit all `critical` items first, up to `cap`.
    /// 3. Walk the remaining sorted items, skipping types whose strategy is
    ///    disabled, until `cap` is reached.
    ///
    /// Admitted items are removed from the queue before the caller
    /// dispatches them, so a concurrent enqueue can never double-schedule.
    pub fn take_batch(&mut self, cap: usize, strategies: &SyncStrategies) -> Vec<SyncItem> {
        if self.items.is_empty() || cap == 0 {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by_key(|&i| self.items[i].schedule_key());

        let mut selected: Vec<usize> = Vec::new();

        for &i in &order {
            if selected.len() >= cap {
                break;
            }
            if self.items[i].priority == SyncPriority::Critical {
                selected.push(i);
            }
        }

        for &i in &order {
            if selected.len() >= cap {
                break;
            }
            let item = &self.items[i];
            if item.priority == SyncPriority::Critical {
                continue;
            }
            if !strategies.for_type(item.sync_type).enabled {
                continue;
            }
            selected.push(i);
        }

        // Remove back-to-front so indices stay valid; then restore the
        // selection order (criticals first, then priority order).
        let mut removal = selected.clone();
        removal.sort_unstable_by(|a, b| b.cmp(a));
        let mut taken: Vec<(usize, SyncItem)> = removal
            .into_iter()
            .map(|i| (i, self.items.remove(i)))
            .collect();
        let mut batch = Vec::with_capacity(selected.len());
        for index in selected {
            let pos = taken
                .iter()
                .position(|(i, _)| *i == index)
                .unwrap_or_default();
            batch.push(taken.remove(pos).1);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnsync_model::{
        AnalyticsEvent, ConflictPolicy, PaymentIntent, SyncPayload, SyncStrategies, SyncStrategy,
        SyncType,
    };
    use std::time::Duration;

    fn make_item(
        sync_type: SyncType,
        priority: SyncPriority,
        enqueued_at_ms: u64,
    ) -> SyncItem {
        let payload = match sync_type {
            SyncType::Payment => SyncPayload::Payment(PaymentIntent {
                order_id: "ord".into(),
                amount_cents: 100,
                currency: "USD".into(),
                method: "card".into(),
            }),
            _ => SyncPayload::Analytics(AnalyticsEvent {
                event: "e".into(),
                properties: serde_json::json!({}),
                occurred_at_ms: enqueued_at_ms,
            }),
        };
        SyncItem {
            id: Uuid::new_v4(),
            sync_type,
            action: "a".into(),
            payload,
            priority,
            retry_count: 0,
            max_retries: 3,
            dependencies: Vec::new(),
            conflict_resolution: ConflictPolicy::ServerWins,
            enqueued_at_ms,
            metadata: Default::default(),
        }
    }

    #[test]
    fn batch_orders_by_priority_then_enqueue_time() {
        let strategies = SyncStrategies::default();
        let mut queue = SyncQueue::new(10);
        let low = make_item(SyncType::Analytics, SyncPriority::Low, 1);
        let normal = make_item(SyncType::Analytics, SyncPriority::Normal, 2);
        let high_late = make_item(SyncType::Analytics, SyncPriority::High, 9);
        let high_early = make_item(SyncType::Analytics, SyncPriority::High, 3);
        let ids = [high_early.id, high_late.id, normal.id, low.id];
        for item in [low, normal, high_late, high_early] {
            queue.push(item);
        }

        let batch = queue.take_batch(10, &strategies);
        let got: Vec<Uuid> = batch.iter().map(|i| i.id).collect();
        assert_eq!(got, ids);
        assert!(queue.is_empty());
    }

    #[test]
    fn criticals_fill_the_batch_first() {
        let strategies = SyncStrategies::default();
        let mut queue = SyncQueue::new(10);
        // Older high-priority item, newer critical one
        let high = make_item(SyncType::Analytics, SyncPriority::High, 1);
        let critical = make_item(SyncType::Payment, SyncPriority::Critical, 99);
        let critical_id = critical.id;
        queue.push(high);
        queue.push(critical);

        let batch = queue.take_batch(1, &strategies);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, critical_id);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn disabled_types_are_skipped_but_stay_queued() {
        let strategies = SyncStrategies::default().with_strategy(
            SyncType::Analytics,
            SyncStrategy {
                enabled: false,
                priority: SyncPriority::Low,
                max_retries: 1,
                timeout: Duration::from_secs(5),
                conflict_resolution: ConflictPolicy::ClientWins,
                gate_on_dependencies: false,
                batch_size: 50,
            },
        );
        let mut queue = SyncQueue::new(10);
        queue.push(make_item(SyncType::Analytics, SyncPriority::Low, 1));
        let payment = make_item(SyncType::Payment, SyncPriority::Normal, 2);
        let payment_id = payment.id;
        queue.push(payment);

        let batch = queue.take_batch(10, &strategies);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, payment_id);
        // The disabled item remains pending but is not dispatchable
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.items()[0].sync_type, SyncType::Analytics);
        assert!(!queue.has_dispatchable(&strategies));

        // A critical item is dispatchable even when its type is disabled
        queue.push(make_item(SyncType::Analytics, SyncPriority::Critical, 3));
        assert!(queue.has_dispatchable(&strategies));
    }

    #[test]
    fn taken_items_leave_the_queue_before_dispatch() {
        let strategies = SyncStrategies::default();
        let mut queue = SyncQueue::new(10);
        let item = make_item(SyncType::Payment, SyncPriority::Critical, 1);
        let id = item.id;
        queue.push(item);

        let batch = queue.take_batch(5, &strategies);
        assert_eq!(batch.len(), 1);
        assert!(!queue.contains(id));
    }

    #[test]
    fn overflow_evicts_lowest_priority_first() {
        let mut queue = SyncQueue::new(3);
        for ts in 1..=3 {
            queue.push(make_item(SyncType::Analytics, SyncPriority::Normal, ts));
        }
        assert_eq!(queue.len(), 3);

        let critical = make_item(SyncType::Payment, SyncPriority::Critical, 4);
        let critical_id = critical.id;
        let evicted = queue.push(critical).expect("one item must be evicted");

        assert_eq!(queue.len(), 3);
        assert!(queue.contains(critical_id));
        assert_eq!(evicted.priority, SyncPriority::Normal);
        // Newest among the lowest band goes first
        assert_eq!(evicted.enqueued_at_ms, 3);
    }

    #[test]
    fn critical_never_evicted_while_lower_exists() {
        let mut queue = SyncQueue::new(2);
        queue.push(make_item(SyncType::Payment, SyncPriority::Critical, 1));
        queue.push(make_item(SyncType::Analytics, SyncPriority::Low, 2));

        let evicted = queue
            .push(make_item(SyncType::Payment, SyncPriority::Critical, 3))
            .expect("over capacity");
        assert_eq!(evicted.priority, SyncPriority::Low);
        assert!(queue.items().iter().all(|i| i.priority == SyncPriority::Critical));
    }

    #[test]
    fn incoming_lowest_item_is_itself_evicted() {
        let mut queue = SyncQueue::new(2);
        queue.push(make_item(SyncType::Payment, SyncPriority::Critical, 1));
        queue.push(make_item(SyncType::Payment, SyncPriority::Critical, 2));

        let low = make_item(SyncType::Analytics, SyncPriority::Low, 3);
        let low_id = low.id;
        let evicted = queue.push(low).expect("over capacity");
        assert_eq!(evicted.id, low_id);
        assert!(!queue.contains(low_id));
    }

    #[test]
    fn remove_and_clear() {
        let mut queue = SyncQueue::new(10);
        let item = make_item(SyncType::Analytics, SyncPriority::Low, 1);
        let id = item.id;
        queue.push(item);
        queue.push(make_item(SyncType::Analytics, SyncPriority::Low, 2));

        assert!(queue.remove(id).is_some());
        assert!(queue.remove(id).is_none());
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn restore_applies_the_bound() {
        let mut queue = SyncQueue::new(2);
        let items = vec![
            make_item(SyncType::Payment, SyncPriority::Critical, 1),
            make_item(SyncType::Analytics, SyncPriority::Low, 2),
            make_item(SyncType::Analytics, SyncPriority::Low, 3),
        ];
        queue.restore(items);
        assert_eq!(queue.len(), 2);
        assert!(queue.items().iter().any(|i| i.priority == SyncPriority::Critical));
    }
}

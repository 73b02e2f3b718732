use chrono::{DateTime, Utc};
use fretline_catalog::{ReservationToken, Selection};
use fretline_shared::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Order status in the lifecycle. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Submitted,
    Approved,
    InProduction,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The full transition edge set. No edge skips a state and nothing
    /// leaves a terminal status.
    pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (from, to),
            (Draft, Submitted)
                | (Submitted, Approved)
                | (Approved, InProduction)
                | (InProduction, Shipped)
                | (Shipped, Completed)
                | (Draft, Cancelled)
                | (Submitted, Cancelled)
                | (Approved, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Submitted => "SUBMITTED",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::InProduction => "IN_PRODUCTION",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// One configured guitar on an order. `resolved_sku` and `unit_price` are
/// computed at submission and stay fixed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: Uuid,
    /// option_id -> selected value.
    pub selected_options: HashMap<String, Selection>,
    pub quantity: u32,
    pub resolved_sku: Option<String>,
    pub unit_price: Option<Money>,
}

/// One immutable entry of the status history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Absent for the creation entry.
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    /// Account id of the acting principal.
    pub actor: Uuid,
    pub at: DateTime<Utc>,
}

/// A dealer purchase order.
///
/// Mutated only through the lifecycle manager and never physically
/// deleted; cancellation is a terminal status, not removal. The status
/// history is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub account_id: Uuid,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    /// Σ unit_price × quantity over all lines, set at submission.
    pub subtotal: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub status_history: Vec<StatusEntry>,
    /// Outstanding allocations held by this order while SUBMITTED/APPROVED.
    pub reservations: Vec<ReservationToken>,
    /// Optimistic-concurrency version checked on every write.
    pub version: u64,
}

impl Order {
    pub fn new_draft(account_id: Uuid, actor: Uuid, lines: Vec<OrderLine>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            status: OrderStatus::Draft,
            lines,
            subtotal: None,
            created_at: now,
            status_history: vec![StatusEntry {
                from: None,
                to: OrderStatus::Draft,
                actor,
                at: now,
            }],
            reservations: Vec::new(),
            version: 1,
        }
    }

    /// Advance the status and append the corresponding history entry.
    pub fn record_transition(&mut self, to: OrderStatus, actor: Uuid) {
        self.status_history.push(StatusEntry {
            from: Some(self.status),
            to,
            actor,
            at: Utc::now(),
        });
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_appended_per_transition() {
        let actor = Uuid::new_v4();
        let mut order = Order::new_draft(Uuid::new_v4(), actor, vec![]);
        assert_eq!(order.status_history.len(), 1);

        order.record_transition(OrderStatus::Submitted, actor);
        order.record_transition(OrderStatus::Approved, actor);

        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.status_history.len(), 3);
        let last = order.status_history.last().unwrap();
        assert_eq!(last.from, Some(OrderStatus::Submitted));
        assert_eq!(last.to, OrderStatus::Approved);
    }

    #[test]
    fn test_edge_set_is_exact() {
        use OrderStatus::*;
        let all = [
            Draft,
            Submitted,
            Approved,
            InProduction,
            Shipped,
            Completed,
            Cancelled,
        ];
        let allowed = [
            (Draft, Submitted),
            (Submitted, Approved),
            (Approved, InProduction),
            (InProduction, Shipped),
            (Shipped, Completed),
            (Draft, Cancelled),
            (Submitted, Cancelled),
            (Approved, Cancelled),
        ];
        for from in all {
            for to in all {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    OrderStatus::can_transition(from, to),
                    expected,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }
}

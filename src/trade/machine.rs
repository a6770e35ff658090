/// Pure purchase/sale state machine.
///
/// Item status is a projection of the active transaction: available while
/// none, frozen while one is in flight, complete once one completes. Steps
/// attempted from the wrong state are rejected with the specific reason;
/// rejections are user-facing warnings, not errors.
// region:    --- Imports
use crate::catalog::model::ItemStatus;

// endregion: --- Imports

// region:    --- States & Inputs

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Initiated,
    Acknowledged,
    SellerPending,
    BuyerPending,
    Complete,
    Cancelled,
}

impl TransactionStatus {
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            0 => Some(TransactionStatus::Initiated),
            1 => Some(TransactionStatus::Acknowledged),
            2 => Some(TransactionStatus::SellerPending),
            3 => Some(TransactionStatus::BuyerPending),
            4 => Some(TransactionStatus::Complete),
            5 => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            TransactionStatus::Initiated => 0,
            TransactionStatus::Acknowledged => 1,
            TransactionStatus::SellerPending => 2,
            TransactionStatus::BuyerPending => 3,
            TransactionStatus::Complete => 4,
            TransactionStatus::Cancelled => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionStatus::Initiated => "initiated",
            TransactionStatus::Acknowledged => "acknowledged",
            TransactionStatus::SellerPending => "seller pending",
            TransactionStatus::BuyerPending => "buyer pending",
            TransactionStatus::Complete => "complete",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Complete | TransactionStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Acknowledge,
    Confirm,
    Cancel,
}

// endregion: --- States & Inputs

// region:    --- Outcome

/// An accepted step: the statuses to persist and the audit labels to append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub transaction_status: TransactionStatus,
    pub item_status: Option<ItemStatus>,
    pub transaction_log: &'static str,
    pub item_log: Option<&'static str>,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied(Applied),
    Rejected { warning: &'static str },
}

fn rejected(warning: &'static str) -> Outcome {
    Outcome::Rejected { warning }
}

// endregion: --- Outcome

// region:    --- Transitions

/// Gate for creating a transaction against an item.
pub fn check_create(item_status: ItemStatus, buyer_is_seller: bool) -> Result<(), &'static str> {
    if item_status != ItemStatus::Available {
        return Err("Item unavailable for purchase.");
    }
    if buyer_is_seller {
        return Err("Cannot purchase an item you are selling.");
    }
    Ok(())
}

/// Evaluate one actor-gated step against the current status.
pub fn step(status: TransactionStatus, role: Role, action: Action) -> Outcome {
    use Action::*;
    use ItemStatus as IS;
    use Role::*;
    use TransactionStatus as TS;

    match (role, action, status) {
        // seller acknowledges the initiated purchase
        (Seller, Acknowledge, TS::Initiated) => Outcome::Applied(Applied {
            transaction_status: TS::Acknowledged,
            item_status: None,
            transaction_log: "acknowledged",
            item_log: None,
            message: "Sale acknowledged.",
        }),
        (Seller, Acknowledge, _) => rejected("Cannot acknowledge - sale not in initiated state."),
        (Buyer, Acknowledge, _) => rejected("Only the seller can acknowledge a sale."),

        // buyer confirmation
        (Buyer, Confirm, TS::Acknowledged) => Outcome::Applied(Applied {
            transaction_status: TS::SellerPending,
            item_status: None,
            transaction_log: "confirmed",
            item_log: None,
            message: "Purchase confirmed, awaiting seller confirmation.",
        }),
        (Buyer, Confirm, TS::BuyerPending) => Outcome::Applied(Applied {
            transaction_status: TS::Complete,
            item_status: Some(IS::Complete),
            transaction_log: "confirmed and completed",
            item_log: Some("completed"),
            message: "Purchase confirmed by both parties and completed.",
        }),
        (Buyer, Confirm, TS::Initiated) => {
            rejected("Cannot confirm - awaiting seller acknowledgement.")
        }
        (Buyer, Confirm, TS::SellerPending) => {
            rejected("Already confirmed - awaiting seller confirmation.")
        }
        (Buyer, Confirm, TS::Complete) => {
            rejected("Already confirmed - purchase has already been completed.")
        }
        (Buyer, Confirm, TS::Cancelled) => {
            rejected("Cannot confirm - purchase has already been cancelled.")
        }

        // seller confirmation
        (Seller, Confirm, TS::Acknowledged) => Outcome::Applied(Applied {
            transaction_status: TS::BuyerPending,
            item_status: None,
            transaction_log: "confirmed",
            item_log: None,
            message: "Sale confirmed, awaiting buyer confirmation.",
        }),
        (Seller, Confirm, TS::SellerPending) => Outcome::Applied(Applied {
            transaction_status: TS::Complete,
            item_status: Some(IS::Complete),
            transaction_log: "confirmed and completed",
            item_log: Some("completed"),
            message: "Sale confirmed by both parties and completed.",
        }),
        (Seller, Confirm, TS::Initiated) => rejected("Cannot confirm - acknowledge the sale first."),
        (Seller, Confirm, TS::BuyerPending) => {
            rejected("Already confirmed - awaiting buyer confirmation.")
        }
        (Seller, Confirm, TS::Complete) => {
            rejected("Already confirmed - sale has already been completed.")
        }
        (Seller, Confirm, TS::Cancelled) => {
            rejected("Cannot confirm - sale has already been cancelled.")
        }

        // cancellation, by either party, from any non-terminal state
        (_, Cancel, TS::Complete) => {
            rejected("Cannot cancel a transaction which has already been completed.")
        }
        (_, Cancel, TS::Cancelled) => rejected("Already cancelled."),
        (Buyer, Cancel, _) => Outcome::Applied(Applied {
            transaction_status: TS::Cancelled,
            item_status: Some(IS::Available),
            transaction_log: "cancelled",
            item_log: Some("unfroze"),
            message: "Purchase cancelled.",
        }),
        (Seller, Cancel, _) => Outcome::Applied(Applied {
            transaction_status: TS::Cancelled,
            item_status: Some(IS::Available),
            transaction_log: "cancelled",
            item_log: Some("unfroze"),
            message: "Sale cancelled.",
        }),
    }
}

// endregion: --- Transitions

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use Action::*;
    use Role::*;
    use TransactionStatus as TS;

    fn applied(outcome: Outcome) -> Applied {
        match outcome {
            Outcome::Applied(a) => a,
            Outcome::Rejected { warning } => panic!("unexpected rejection: {warning}"),
        }
    }

    fn warning(outcome: Outcome) -> &'static str {
        match outcome {
            Outcome::Rejected { warning } => warning,
            Outcome::Applied(a) => panic!("unexpected acceptance: {a:?}"),
        }
    }

    #[test]
    fn create_gate() {
        assert!(check_create(ItemStatus::Available, false).is_ok());
        assert!(check_create(ItemStatus::Frozen, false).is_err());
        assert!(check_create(ItemStatus::Complete, false).is_err());
        assert!(check_create(ItemStatus::Available, true).is_err());
    }

    #[test]
    fn full_happy_path_completes_item_and_transaction() {
        // create -> acknowledge -> buyer-confirm -> seller-confirm
        let a = applied(step(TS::Initiated, Seller, Acknowledge));
        assert_eq!(a.transaction_status, TS::Acknowledged);
        assert_eq!(a.item_status, None);

        let b = applied(step(a.transaction_status, Buyer, Confirm));
        assert_eq!(b.transaction_status, TS::SellerPending);

        let c = applied(step(b.transaction_status, Seller, Confirm));
        assert_eq!(c.transaction_status, TS::Complete);
        assert_eq!(c.item_status, Some(ItemStatus::Complete));
    }

    #[test]
    fn seller_first_path_also_completes() {
        let a = applied(step(TS::Acknowledged, Seller, Confirm));
        assert_eq!(a.transaction_status, TS::BuyerPending);

        let b = applied(step(a.transaction_status, Buyer, Confirm));
        assert_eq!(b.transaction_status, TS::Complete);
        assert_eq!(b.item_status, Some(ItemStatus::Complete));
    }

    #[test]
    fn second_acknowledge_is_a_warning_no_op() {
        let a = applied(step(TS::Initiated, Seller, Acknowledge));
        let w = warning(step(a.transaction_status, Seller, Acknowledge));
        assert_eq!(w, "Cannot acknowledge - sale not in initiated state.");
    }

    #[test]
    fn buyer_confirm_before_acknowledgement_names_the_reason() {
        let w = warning(step(TS::Initiated, Buyer, Confirm));
        assert_eq!(w, "Cannot confirm - awaiting seller acknowledgement.");
    }

    #[test]
    fn cancel_from_every_non_terminal_state_restores_available() {
        for status in [TS::Initiated, TS::Acknowledged, TS::SellerPending, TS::BuyerPending] {
            for role in [Buyer, Seller] {
                let a = applied(step(status, role, Cancel));
                assert_eq!(a.transaction_status, TS::Cancelled);
                assert_eq!(a.item_status, Some(ItemStatus::Available));
            }
        }
    }

    #[test]
    fn cancel_after_terminal_is_rejected() {
        assert_eq!(
            warning(step(TS::Complete, Buyer, Cancel)),
            "Cannot cancel a transaction which has already been completed."
        );
        assert_eq!(warning(step(TS::Cancelled, Seller, Cancel)), "Already cancelled.");
    }

    #[test]
    fn confirm_after_terminal_is_rejected() {
        assert!(matches!(step(TS::Complete, Buyer, Confirm), Outcome::Rejected { .. }));
        assert!(matches!(step(TS::Cancelled, Seller, Confirm), Outcome::Rejected { .. }));
    }

    #[test]
    fn double_confirm_by_same_party_is_rejected() {
        assert_eq!(
            warning(step(TS::SellerPending, Buyer, Confirm)),
            "Already confirmed - awaiting seller confirmation."
        );
        assert_eq!(
            warning(step(TS::BuyerPending, Seller, Confirm)),
            "Already confirmed - awaiting buyer confirmation."
        );
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            TS::Initiated,
            TS::Acknowledged,
            TS::SellerPending,
            TS::BuyerPending,
            TS::Complete,
            TS::Cancelled,
        ] {
            assert_eq!(TransactionStatus::from_i16(status.as_i16()), Some(status));
        }
        assert_eq!(TransactionStatus::from_i16(9), None);
    }
}

// endregion: --- Tests

//! Shape checks on caller input, run before anything is read from the store.

use std::collections::HashSet;

use rust_decimal::Decimal;

use super::error::ValidationError;
use super::types::{CounterpartySelection, LedgerEntryInput, PaymentApplicationInput};

/// Validates a proposed sale or purchase.
///
/// # Errors
///
/// Returns the first input fault found.
pub fn validate_entry_input(input: &LedgerEntryInput) -> Result<(), ValidationError> {
    if input.items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    for item in &input.items {
        if item.quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity(item.product_id));
        }
        if let Some(price) = item.unit_price
            && price < Decimal::ZERO
        {
            return Err(ValidationError::NegativeUnitPrice(item.product_id));
        }
    }

    if input.payment_status.has_payment() && input.payment_method.is_none() {
        return Err(ValidationError::PaymentMethodRequired);
    }

    if let CounterpartySelection::New { name, .. } = &input.counterparty
        && name.trim().is_empty()
    {
        return Err(ValidationError::EmptyCounterpartyName);
    }

    Ok(())
}

/// Validates a payment application before entries are loaded.
///
/// # Errors
///
/// Returns the first input fault found.
pub fn validate_payment_input(input: &PaymentApplicationInput) -> Result<(), ValidationError> {
    if input.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePayment);
    }
    if input.selected_entry_ids.is_empty() {
        return Err(ValidationError::NoEntriesSelected);
    }

    let mut seen = HashSet::with_capacity(input.selected_entry_ids.len());
    for id in &input.selected_entry_ids {
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicateSelection(*id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{EntryType, LineItemInput, PaymentMethod, PaymentStatus};
    use chrono::NaiveDate;
    use khata_shared::types::{CounterpartyId, LedgerEntryId, ProductId};
    use rust_decimal_macros::dec;

    fn input() -> LedgerEntryInput {
        LedgerEntryInput {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            entry_type: EntryType::Sale,
            counterparty: CounterpartySelection::Anonymous { name: None },
            items: vec![LineItemInput {
                product_id: ProductId::new(),
                quantity: 2,
                unit_price: Some(dec!(45)),
            }],
            apply_gst: false,
            payment_status: PaymentStatus::Paid,
            payment_method: Some(PaymentMethod::Cash),
            amount_paid_now: None,
            notes: None,
        }
    }

    fn payment() -> PaymentApplicationInput {
        PaymentApplicationInput {
            entity_id: CounterpartyId::new(),
            entry_type: EntryType::Sale,
            amount: dec!(100),
            method: PaymentMethod::Upi,
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            selected_entry_ids: vec![LedgerEntryId::new()],
            notes: None,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_entry_input(&input()).is_ok());
    }

    #[test]
    fn test_empty_items() {
        let mut bad = input();
        bad.items.clear();
        assert_eq!(validate_entry_input(&bad), Err(ValidationError::EmptyItems));
    }

    #[test]
    fn test_zero_quantity() {
        let mut bad = input();
        bad.items[0].quantity = 0;
        let product = bad.items[0].product_id;
        assert_eq!(
            validate_entry_input(&bad),
            Err(ValidationError::NonPositiveQuantity(product))
        );
    }

    #[test]
    fn test_negative_price() {
        let mut bad = input();
        bad.items[0].unit_price = Some(dec!(-0.01));
        assert!(matches!(
            validate_entry_input(&bad),
            Err(ValidationError::NegativeUnitPrice(_))
        ));
    }

    #[test]
    fn test_method_required_for_partial() {
        let mut bad = input();
        bad.payment_status = PaymentStatus::Partial;
        bad.payment_method = None;
        assert_eq!(
            validate_entry_input(&bad),
            Err(ValidationError::PaymentMethodRequired)
        );

        let mut ok = input();
        ok.payment_status = PaymentStatus::Pending;
        ok.payment_method = None;
        assert!(validate_entry_input(&ok).is_ok());
    }

    #[test]
    fn test_new_counterparty_needs_name() {
        let mut bad = input();
        bad.counterparty = CounterpartySelection::New {
            name: "  ".into(),
            phone: None,
        };
        assert_eq!(
            validate_entry_input(&bad),
            Err(ValidationError::EmptyCounterpartyName)
        );
    }

    #[test]
    fn test_payment_input() {
        assert!(validate_payment_input(&payment()).is_ok());

        let mut bad = payment();
        bad.amount = dec!(0);
        assert_eq!(
            validate_payment_input(&bad),
            Err(ValidationError::NonPositivePayment)
        );

        let mut bad = payment();
        bad.selected_entry_ids.clear();
        assert_eq!(
            validate_payment_input(&bad),
            Err(ValidationError::NoEntriesSelected)
        );

        let mut bad = payment();
        let id = bad.selected_entry_ids[0];
        bad.selected_entry_ids.push(id);
        assert_eq!(
            validate_payment_input(&bad),
            Err(ValidationError::DuplicateSelection(id))
        );
    }
}

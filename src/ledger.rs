// 📒 Ledger Merger - One signed, chronological list across entry types
//
// Sign convention (assigned here, never stored):
//   Tax      → +amount   (regardless of paid status)
//   Donation → +amount
//   Payment  → -|amount| (always an outflow, whatever the stored sign)
//
// Ordering: date descending. Same-date transactions keep Tax, then Donation,
// then Payment, and within a kind the feed arrival order (stable sort).
//
// The net position is NOT derived from this list: it uses the paid-only tax
// total. "Net" tracks realized cash, the ledger tracks recorded activity.

use crate::aggregate::{donation_total, expense_total, tax_total};
use crate::model::{DonationEntry, PaymentEntry, Record, TaxEntry};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TRANSACTION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Tax,
    Donation,
    Payment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Tax => "Tax",
            TransactionKind::Donation => "Donation",
            TransactionKind::Payment => "Payment",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// UNIFIED TRANSACTION
// ============================================================================

/// One row of the unified ledger. `kind` is exported under the key `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTransaction {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub name: String,
    pub amount: f64,
}

impl From<&Record<TaxEntry>> for UnifiedTransaction {
    fn from(entry: &Record<TaxEntry>) -> Self {
        UnifiedTransaction {
            date: entry.payment_date.clone(),
            kind: TransactionKind::Tax,
            name: entry.devotee_name.clone(),
            amount: entry.amount,
        }
    }
}

impl From<&Record<DonationEntry>> for UnifiedTransaction {
    fn from(entry: &Record<DonationEntry>) -> Self {
        UnifiedTransaction {
            date: entry.payment_date.clone(),
            kind: TransactionKind::Donation,
            name: entry.devotee_name.clone(),
            amount: entry.amount,
        }
    }
}

impl From<&Record<PaymentEntry>> for UnifiedTransaction {
    fn from(entry: &Record<PaymentEntry>) -> Self {
        UnifiedTransaction {
            date: entry.payment_date.clone(),
            kind: TransactionKind::Payment,
            name: entry.payee_name.clone(),
            amount: -entry.amount.abs(),
        }
    }
}

/// Merge the three entry streams into one ledger, most recent first
pub fn merge(
    tax_entries: &[Record<TaxEntry>],
    donation_entries: &[Record<DonationEntry>],
    payment_entries: &[Record<PaymentEntry>],
) -> Vec<UnifiedTransaction> {
    let mut transactions: Vec<UnifiedTransaction> =
        Vec::with_capacity(tax_entries.len() + donation_entries.len() + payment_entries.len());

    transactions.extend(tax_entries.iter().map(UnifiedTransaction::from));
    transactions.extend(donation_entries.iter().map(UnifiedTransaction::from));
    transactions.extend(payment_entries.iter().map(UnifiedTransaction::from));

    // stable: ties keep concatenation order
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
    transactions
}

// ============================================================================
// NET POSITION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetPosition {
    /// Paid-only tax total
    pub total_tax: f64,
    pub total_donations: f64,
    pub total_payments: f64,
    pub net: f64,
}

impl NetPosition {
    pub fn compute(
        tax_entries: &[Record<TaxEntry>],
        donation_entries: &[Record<DonationEntry>],
        payment_entries: &[Record<PaymentEntry>],
    ) -> Self {
        let total_tax = tax_total(tax_entries);
        let total_donations = donation_total(donation_entries);
        let total_payments = expense_total(payment_entries);

        NetPosition {
            total_tax,
            total_donations,
            total_payments,
            net: total_tax + total_donations - total_payments,
        }
    }

    pub fn is_surplus(&self) -> bool {
        self.net >= 0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaxType;

    fn tax(name: &str, date: &str, amount: f64, paid: bool) -> Record<TaxEntry> {
        Record::new(
            format!("t-{}-{}", name, date),
            TaxEntry {
                devotee_name: name.to_string(),
                village_name: "Kovilur".to_string(),
                tax_type: Some(TaxType::Full),
                year: 2024,
                amount,
                payment_date: date.to_string(),
                paid,
                created_at: String::new(),
            },
        )
    }

    fn donation(name: &str, date: &str, amount: f64) -> Record<DonationEntry> {
        Record::new(
            format!("d-{}-{}", name, date),
            DonationEntry {
                devotee_name: name.to_string(),
                donation_type: "Annadhanam".to_string(),
                amount,
                payment_date: date.to_string(),
                notes: String::new(),
                created_at: String::new(),
            },
        )
    }

    fn payment(payee: &str, date: &str, amount: f64) -> Record<PaymentEntry> {
        Record::new(
            format!("p-{}-{}", payee, date),
            PaymentEntry {
                payee_name: payee.to_string(),
                category: "Maintenance".to_string(),
                amount,
                payment_date: date.to_string(),
                notes: String::new(),
                created_at: String::new(),
            },
        )
    }

    #[test]
    fn test_payments_always_outflow() {
        let payments = vec![payment("Electrician", "2024-03-01", 250.0), payment("Refund", "2024-03-02", -40.0)];

        let ledger = merge(&[], &[], &payments);

        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|tx| tx.kind == TransactionKind::Payment));
        assert_eq!(ledger[0].amount, -40.0);
        assert_eq!(ledger[1].amount, -250.0);
    }

    #[test]
    fn test_tax_merged_regardless_of_paid() {
        let taxes = vec![tax("A", "2024-01-10", 100.0, true), tax("B", "2024-01-11", 50.0, false)];

        let ledger = merge(&taxes, &[], &[]);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].name, "B");
        assert_eq!(ledger[0].amount, 50.0);
    }

    #[test]
    fn test_sorted_most_recent_first() {
        let ledger = merge(
            &[tax("A", "2023-12-31", 100.0, true)],
            &[donation("C", "2024-02-01", 75.0)],
            &[payment("Florist", "2024-01-15", 30.0)],
        );

        let dates: Vec<&str> = ledger.iter().map(|tx| tx.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-02-01", "2024-01-15", "2023-12-31"]);
    }

    #[test]
    fn test_same_date_tiebreak_kind_then_arrival() {
        let ledger = merge(
            &[tax("A", "2024-05-01", 10.0, true), tax("B", "2024-05-01", 20.0, true)],
            &[donation("C", "2024-05-01", 30.0)],
            &[payment("D", "2024-05-01", 40.0)],
        );

        let names: Vec<&str> = ledger.iter().map(|tx| tx.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let taxes = vec![tax("A", "2024-01-01", 100.0, true)];
        let donations = vec![donation("B", "2024-01-01", 10.0)];
        let payments = vec![payment("C", "2024-01-02", 5.0)];

        let first = merge(&taxes, &donations, &payments);
        let second = merge(&taxes, &donations, &payments);

        assert_eq!(first, second);
    }

    #[test]
    fn test_net_position_uses_paid_tax_only() {
        let taxes = vec![tax("A", "2024-01-01", 100.0, true), tax("B", "2024-01-01", 50.0, false)];
        let donations = vec![donation("C", "2024-01-01", 30.0)];
        let payments = vec![payment("D", "2024-01-01", 80.0)];

        let net = NetPosition::compute(&taxes, &donations, &payments);

        assert_eq!(net.total_tax, 100.0);
        assert_eq!(net.total_donations, 30.0);
        assert_eq!(net.total_payments, 80.0);
        assert_eq!(net.net, 50.0);
        assert!(net.is_surplus());

        // The ledger itself still carries the pending tax row
        let ledger_sum: f64 = merge(&taxes, &donations, &payments).iter().map(|tx| tx.amount).sum();
        assert_eq!(ledger_sum, 100.0);
    }

    #[test]
    fn test_kind_exported_as_type() {
        let tx = UnifiedTransaction {
            date: "2024-01-01".to_string(),
            kind: TransactionKind::Donation,
            name: "A".to_string(),
            amount: 10.0,
        };

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "Donation");
        assert!(value.get("kind").is_none());
    }
}

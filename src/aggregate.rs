// ➕ Aggregator - Scalar totals over feed snapshots
//
// Pure reductions: sum of amountOf(r) over records satisfying a predicate.
// Every total is recomputed in full from the current snapshots; nothing is cached.
//
// NOTE: the dashboard tax total ignores devotee status, while the tax report
// (report.rs) applies the active-devotee filter. Both behaviors are kept.

use crate::model::{
    DonationEntry, InterestEntry, PaymentEntry, Record, TaxEntry, Devotee, Village,
};
use serde::{Deserialize, Serialize};

/// Sum `amount_of(r)` over every record that satisfies `predicate`.
/// Empty input sums to zero.
pub fn aggregate<R, P, A>(records: &[R], predicate: P, amount_of: A) -> f64
where
    P: Fn(&R) -> bool,
    A: Fn(&R) -> f64,
{
    records
        .iter()
        .filter(|r| predicate(*r))
        .map(|r| amount_of(r))
        .sum()
}

// ============================================================================
// CONCRETE INSTANTIATIONS
// ============================================================================

pub fn devotee_count(devotees: &[Record<Devotee>]) -> usize {
    devotees.len()
}

pub fn village_count(villages: &[Record<Village>]) -> usize {
    villages.len()
}

/// Realized tax income: only `paid == true` entries count
pub fn tax_total(entries: &[Record<TaxEntry>]) -> f64 {
    aggregate(entries, |e| e.paid, |e| e.amount)
}

/// Outstanding tax: `paid == false` entries
pub fn tax_pending_total(entries: &[Record<TaxEntry>]) -> f64 {
    aggregate(entries, |e| !e.paid, |e| e.amount)
}

/// Donations count on record; there is no paid/pending state
pub fn donation_total(entries: &[Record<DonationEntry>]) -> f64 {
    aggregate(entries, |_| true, |e| e.amount)
}

pub fn interest_total(entries: &[Record<InterestEntry>]) -> f64 {
    aggregate(entries, |_| true, |e| e.interest_amount)
}

pub fn principal_total(entries: &[Record<InterestEntry>]) -> f64 {
    aggregate(entries, |_| true, |e| e.principal_amount)
}

pub fn expense_total(entries: &[Record<PaymentEntry>]) -> f64 {
    aggregate(entries, |_| true, |e| e.amount)
}

// ============================================================================
// DASHBOARD
// ============================================================================

/// Dashboard figures. Plain numbers; currency formatting is a presentation concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub devotees_count: usize,
    pub villages_count: usize,
    pub tax_total: f64,
    pub donation_total: f64,
    pub interest_total: f64,
    pub expense_total: f64,
}

impl DashboardTotals {
    pub fn compute(
        devotees: &[Record<Devotee>],
        villages: &[Record<Village>],
        tax_entries: &[Record<TaxEntry>],
        donation_entries: &[Record<DonationEntry>],
        interest_entries: &[Record<InterestEntry>],
        payment_entries: &[Record<PaymentEntry>],
    ) -> Self {
        DashboardTotals {
            devotees_count: devotee_count(devotees),
            villages_count: village_count(villages),
            tax_total: tax_total(tax_entries),
            donation_total: donation_total(donation_entries),
            interest_total: interest_total(interest_entries),
            expense_total: expense_total(payment_entries),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} devotees, {} villages | tax {:.2}, donations {:.2}, interest {:.2}, expenses {:.2}",
            self.devotees_count,
            self.villages_count,
            self.tax_total,
            self.donation_total,
            self.interest_total,
            self.expense_total
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

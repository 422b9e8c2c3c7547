// 🔎 Report Filter - User-selected views over entry lists
//
// Tax report rules:
//   1. Year filter: optional; `None` means "All Years".
//   2. Active-devotee filter: ALWAYS applied. An entry is shown only if its
//      devotee name resolves to a devotee whose status is Active.
//   3. totalPaid / totalPending are recomputed over the visible subset only.
//
// The devotee join is by name, not id. It is modeled as an explicit lookup with
// three outcomes so that "name no longer resolves" is a visible branch.

use crate::aggregate::{
    donation_total, expense_total, interest_total, principal_total, tax_pending_total, tax_total,
};
use crate::feed::Snapshot;
use crate::model::{Devotee, DonationEntry, InterestEntry, PaymentEntry, Record, TaxEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub const ALL_YEARS_LABEL: &str = "All Years";

// ============================================================================
// YEAR OPTIONS
// ============================================================================

/// One entry of the year selector. `value == None` is the "All Years" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearOption {
    pub label: String,
    pub value: Option<i32>,
}

impl YearOption {
    pub fn all_years() -> Self {
        YearOption {
            label: ALL_YEARS_LABEL.to_string(),
            value: None,
        }
    }

    pub fn year(year: i32) -> Self {
        YearOption {
            label: year.to_string(),
            value: Some(year),
        }
    }
}

/// "All Years" followed by the distinct years present, newest first.
/// Entries without a year only show up under "All Years".
pub fn year_options(entries: &[Record<TaxEntry>]) -> Vec<YearOption> {
    let years: BTreeSet<i32> = entries.iter().map(|e| e.year).filter(|y| *y > 0).collect();

    std::iter::once(YearOption::all_years())
        .chain(years.into_iter().rev().map(YearOption::year))
        .collect()
}

fn matches_year(entry: &TaxEntry, year: Option<i32>) -> bool {
    year.map_or(true, |y| entry.year == y)
}

// ============================================================================
// DEVOTEE DIRECTORY (explicit name join)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevoteeLookup {
    /// At least one devotee with this name is Active
    Active,
    /// Devotee(s) exist under this name but none is Active
    Inactive,
    /// No current devotee carries this name
    Unresolved,
}

/// Index of devotees by `taxperson_name`, built from one devotees snapshot
pub struct DevoteeDirectory<'a> {
    by_name: HashMap<&'a str, Vec<&'a Devotee>>,
}

impl<'a> DevoteeDirectory<'a> {
    pub fn new(devotees: &'a [Record<Devotee>]) -> Self {
        let mut by_name: HashMap<&'a str, Vec<&'a Devotee>> = HashMap::new();
        for record in devotees {
            by_name
                .entry(record.value.taxperson_name.as_str())
                .or_default()
                .push(&record.value);
        }
        DevoteeDirectory { by_name }
    }

    /// All devotees registered under a name (empty when unresolved)
    pub fn find(&self, name: &str) -> Option<&[&'a Devotee]> {
        self.by_name.get(name).map(|v| v.as_slice())
    }

    pub fn resolve(&self, name: &str) -> DevoteeLookup {
        match self.find(name) {
            None => DevoteeLookup::Unresolved,
            Some(devotees) if devotees.iter().any(|d| d.status.is_active()) => {
                DevoteeLookup::Active
            }
            Some(_) => DevoteeLookup::Inactive,
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.resolve(name) == DevoteeLookup::Active
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ============================================================================
// TAX REPORT
// ============================================================================

/// Rows hidden from a tax report and why
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRows {
    pub other_year: usize,
    pub inactive_devotee: usize,
    pub unresolved_devotee: usize,
}

impl ExcludedRows {
    pub fn total(&self) -> usize {
        self.other_year + self.inactive_devotee + self.unresolved_devotee
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxReport {
    pub selected_year: Option<i32>,
    pub entries: Snapshot<TaxEntry>,
    pub total_paid: f64,
    pub total_pending: f64,
    pub excluded: ExcludedRows,
}

impl TaxReport {
    pub fn row_count(&self) -> usize {
        self.entries.len()
    }
}

/// Build the tax report view: year filter + mandatory active-devotee filter
pub fn tax_report(
    entries: &[Record<TaxEntry>],
    devotees: &[Record<Devotee>],
    selected_year: Option<i32>,
) -> TaxReport {
    let directory = DevoteeDirectory::new(devotees);
    let mut excluded = ExcludedRows::default();

    let visible: Snapshot<TaxEntry> = entries
        .iter()
        .filter(|entry| {
            if !matches_year(entry, selected_year) {
                excluded.other_year += 1;
                return false;
            }
            match directory.resolve(&entry.devotee_name) {
                DevoteeLookup::Active => true,
                DevoteeLookup::Inactive => {
                    excluded.inactive_devotee += 1;
                    false
                }
                DevoteeLookup::Unresolved => {
                    excluded.unresolved_devotee += 1;
                    false
                }
            }
        })
        .cloned()
        .collect();

    debug!(
        year = ?selected_year,
        shown = visible.len(),
        unresolved = excluded.unresolved_devotee,
        inactive = excluded.inactive_devotee,
        "tax report filtered"
    );

    TaxReport {
        selected_year,
        total_paid: tax_total(&visible),
        total_pending: tax_pending_total(&visible),
        entries: visible,
        excluded,
    }
}

// ============================================================================
// SIMPLE ENTRY REPORTS
// ============================================================================

/// Unfiltered list of entries with one total (donation and payment reports)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryReport<T> {
    pub entries: Snapshot<T>,
    pub total: f64,
}

pub fn donation_report(entries: &[Record<DonationEntry>]) -> EntryReport<DonationEntry> {
    EntryReport {
        entries: entries.to_vec(),
        total: donation_total(entries),
    }
}

pub fn payment_report(entries: &[Record<PaymentEntry>]) -> EntryReport<PaymentEntry> {
    EntryReport {
        entries: entries.to_vec(),
        total: expense_total(entries),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestReport {
    pub entries: Snapshot<InterestEntry>,
    pub total_interest: f64,
    pub total_principal: f64,
}

pub fn interest_report(entries: &[Record<InterestEntry>]) -> InterestReport {
    InterestReport {
        entries: entries.to_vec(),
        total_interest: interest_total(entries),
        total_principal: principal_total(entries),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, TaxType};

    fn tax(id: &str, name: &str, year: i32, amount: f64, paid: bool) -> Record<TaxEntry> {
        Record::new(
            id,
            TaxEntry {
                devotee_name: name.to_string(),
                village_name: "Kovilur".to_string(),
                tax_type: Some(TaxType::Full),
                year,
                amount,
                payment_date: format!("{}-04-14", year),
                paid,
                created_at: String::new(),
            },
        )
    }

    fn devotee(name: &str, status: Status) -> Record<Devotee> {
        Record::new(
            format!("dev-{}", name),
            Devotee {
                village_name: "Kovilur".to_string(),
                taxperson_name: name.to_string(),
                father_name: String::new(),
                tax_type: Some(TaxType::Full),
                status,
                spl_name: String::new(),
                current_location: String::new(),
                created_at: String::new(),
            },
        )
    }

    fn scenario_entries() -> Vec<Record<TaxEntry>> {
        vec![
            tax("t1", "A", 2023, 100.0, true),
            tax("t2", "B", 2023, 50.0, false),
            tax("t3", "A", 2024, 100.0, true),
        ]
    }

    #[test]
    fn test_year_options_descending_with_sentinel() {
        let mut entries = scenario_entries();
        entries.push(tax("t4", "C", 2021, 10.0, true));

        let options = year_options(&entries);
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();

        assert_eq!(labels, vec!["All Years", "2024", "2023", "2021"]);
        assert_eq!(options[0].value, None);
        assert_eq!(options[1].value, Some(2024));
    }

    #[test]
    fn test_year_options_empty() {
        assert_eq!(year_options(&[]), vec![YearOption::all_years()]);
    }

    #[test]
    fn test_report_all_years() {
        let devotees = vec![devotee("A", Status::Active), devotee("B", Status::Active)];

        let report = tax_report(&scenario_entries(), &devotees, None);

        assert_eq!(report.row_count(), 3);
        assert_eq!(report.total_paid, 200.0);
        assert_eq!(report.total_pending, 50.0);
        assert_eq!(report.excluded.total(), 0);
    }

    #[test]
    fn test_report_single_year() {
        let devotees = vec![devotee("A", Status::Active), devotee("B", Status::Active)];

        let report = tax_report(&scenario_entries(), &devotees, Some(2023));

        assert_eq!(report.row_count(), 2);
        assert_eq!(report.total_paid, 100.0);
        assert_eq!(report.total_pending, 50.0);
        assert_eq!(report.excluded.other_year, 1);
    }

    #[test]
    fn test_inactive_devotee_dropped_regardless_of_year() {
        let devotees = vec![devotee("A", Status::Active), devotee("B", Status::Inactive)];

        for year in [None, Some(2023)] {
            let report = tax_report(&scenario_entries(), &devotees, year);
            assert!(report.entries.iter().all(|e| e.devotee_name != "B"));
            assert_eq!(report.total_pending, 0.0);
            assert_eq!(report.excluded.inactive_devotee, 1);
        }
    }

    #[test]
    fn test_unresolved_devotee_silently_excluded() {
        let devotees = vec![devotee("A", Status::Active)];

        let report = tax_report(&scenario_entries(), &devotees, None);

        assert_eq!(report.row_count(), 2);
        assert_eq!(report.excluded.unresolved_devotee, 1);
        // Dashboard total does not apply the filter
        assert_eq!(tax_total(&scenario_entries()), 200.0);
    }

    #[test]
    fn test_directory_duplicate_names_any_active() {
        let devotees = vec![devotee("A", Status::Inactive), devotee("A", Status::Active)];
        let directory = DevoteeDirectory::new(&devotees);

        assert_eq!(directory.resolve("A"), DevoteeLookup::Active);
        assert_eq!(directory.find("A").map(|d| d.len()), Some(2));
        assert_eq!(directory.resolve("Z"), DevoteeLookup::Unresolved);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_report_is_idempotent() {
        let entries = scenario_entries();
        let devotees = vec![devotee("A", Status::Active), devotee("B", Status::Active)];

        assert_eq!(
            tax_report(&entries, &devotees, Some(2023)),
            tax_report(&entries, &devotees, Some(2023))
        );
    }

    #[test]
    fn test_simple_reports() {
        let donations = vec![Record::new(
            "d1",
            DonationEntry {
                devotee_name: "A".to_string(),
                donation_type: "Annadhanam".to_string(),
                amount: 1001.0,
                payment_date: "2024-01-14".to_string(),
                notes: String::new(),
                created_at: String::new(),
            },
        )];

        let report = donation_report(&donations);
        assert_eq!(report.total, 1001.0);
        assert_eq!(report.entries.len(), 1);

        let empty = payment_report(&[]);
        assert_eq!(empty.total, 0.0);
        assert!(empty.entries.is_empty());

        let interest = interest_report(&[]);
        assert_eq!(interest.total_interest, 0.0);
    }
}

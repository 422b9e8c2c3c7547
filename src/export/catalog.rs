// 📚 Report Catalog - title, file name and column layout per screen

use super::Column;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    Villages,
    Devotees,
    TaxMasters,
    DonationMasters,
    PettyCashMasters,
    TaxEntries,
    DonationEntries,
    InterestEntries,
    PaymentEntries,
    TaxReport,
    DonationReport,
    PaymentReport,
    OverallReport,
}

impl ReportKind {
    pub const ALL: [ReportKind; 13] = [
        ReportKind::Villages,
        ReportKind::Devotees,
        ReportKind::TaxMasters,
        ReportKind::DonationMasters,
        ReportKind::PettyCashMasters,
        ReportKind::TaxEntries,
        ReportKind::DonationEntries,
        ReportKind::InterestEntries,
        ReportKind::PaymentEntries,
        ReportKind::TaxReport,
        ReportKind::DonationReport,
        ReportKind::PaymentReport,
        ReportKind::OverallReport,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Villages => "Village List",
            ReportKind::Devotees => "Devotees List",
            ReportKind::TaxMasters => "Tax Master",
            ReportKind::DonationMasters => "Donation Master",
            ReportKind::PettyCashMasters => "Petty Cash Master",
            ReportKind::TaxEntries => "Tax Entries",
            ReportKind::DonationEntries => "Donation Entries",
            ReportKind::InterestEntries => "Interest Entries",
            ReportKind::PaymentEntries => "Payment Entries",
            ReportKind::TaxReport => "Tax Report",
            ReportKind::DonationReport => "Donation Report",
            ReportKind::PaymentReport => "Payment Report",
            ReportKind::OverallReport => "Overall Transactions",
        }
    }

    /// Output file name without extension
    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportKind::Villages => "village-list",
            ReportKind::Devotees => "devotees",
            ReportKind::TaxMasters => "tax-master",
            ReportKind::DonationMasters => "donation-master",
            ReportKind::PettyCashMasters => "pettycash-master",
            ReportKind::TaxEntries => "tax-entry",
            ReportKind::DonationEntries => "donation-entry",
            ReportKind::InterestEntries => "interest-entry",
            ReportKind::PaymentEntries => "payment-entry",
            ReportKind::TaxReport => "tax-report",
            ReportKind::DonationReport => "donation-report",
            ReportKind::PaymentReport => "payment-report",
            ReportKind::OverallReport => "overall-report",
        }
    }

    pub fn columns(&self) -> Vec<Column> {
        let spec: &[(&str, &str)] = match self {
            ReportKind::Villages => &[
                ("Village Name", "name"),
                ("Post", "post"),
                ("Taluk", "taluk"),
                ("District", "district"),
                ("Representative", "representative"),
            ],
            ReportKind::Devotees => &[
                ("Village", "villageName"),
                ("Taxperson", "taxpersonName"),
                ("Father", "fatherName"),
                ("Tax Type", "taxType"),
                ("SPL", "splName"),
                ("Location", "currentLocation"),
                ("Status", "status"),
            ],
            ReportKind::TaxMasters => &[
                ("Tax Amount", "taxAmount"),
                ("Type", "type"),
                ("Interest Percentage", "interestPercentage"),
                ("Status", "status"),
            ],
            ReportKind::DonationMasters => &[
                ("Donation Type", "donationType"),
                ("Description", "description"),
                ("Status", "status"),
            ],
            ReportKind::PettyCashMasters => &[
                ("Issue Type", "issueType"),
                ("Description", "description"),
                ("Status", "status"),
            ],
            ReportKind::TaxEntries => &[
                ("Devotee", "devoteeName"),
                ("Village", "villageName"),
                ("Year", "year"),
                ("Amount", "amount"),
                ("Status", "paid"),
            ],
            ReportKind::DonationEntries | ReportKind::DonationReport => &[
                ("Devotee", "devoteeName"),
                ("Donation Type", "donationType"),
                ("Amount", "amount"),
                ("Date", "paymentDate"),
                ("Notes", "notes"),
            ],
            ReportKind::InterestEntries => &[
                ("Devotee", "devoteeName"),
                ("Principal Amount", "principalAmount"),
                ("Interest Amount", "interestAmount"),
                ("Date", "paymentDate"),
                ("Notes", "notes"),
            ],
            ReportKind::PaymentEntries | ReportKind::PaymentReport => &[
                ("Payee", "payeeName"),
                ("Category", "category"),
                ("Amount", "amount"),
                ("Date", "paymentDate"),
                ("Notes", "notes"),
            ],
            ReportKind::TaxReport => &[
                ("Devotee", "devoteeName"),
                ("Village", "villageName"),
                ("Year", "year"),
                ("Amount", "amount"),
                ("Paid", "paid"),
            ],
            ReportKind::OverallReport => &[
                ("Date", "date"),
                ("Type", "type"),
                ("Name", "name"),
                ("Amount", "amount"),
            ],
        };

        spec.iter().map(|(header, key)| Column::new(*header, *key)).collect()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

impl FromStr for ReportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        ReportKind::ALL
            .iter()
            .copied()
            .find(|k| k.file_stem() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ReportKind::ALL.iter().map(|k| k.file_stem()).collect();
                anyhow::anyhow!("Unknown report '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

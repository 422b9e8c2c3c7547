// Temple Ledger - Core Library
// Aggregation, ledger and report views over the temple's document collections.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod model;      // Masters + entries
pub mod feed;       // Live collection snapshots
pub mod aggregate;  // Dashboard totals
pub mod ledger;     // Unified signed ledger + net position
pub mod report;     // Tax / donation / payment / interest views
pub mod books;      // Subscriber state over all feeds
pub mod export;     // Spreadsheet, paged and print renderers
pub mod store;      // SQLite document store
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use model::{
    Collection, Devotee, DonationEntry, DonationMaster, InterestEntry, PaymentEntry,
    PettyCashMaster, Record, Status, TaxEntry, TaxMaster, TaxType, Village,
};
pub use feed::{
    decode_snapshot, CollectionFeed, FeedError, LiveFeed, Snapshot, SnapshotSource, StaticSource,
};
pub use aggregate::DashboardTotals;
pub use ledger::{merge, NetPosition, TransactionKind, UnifiedTransaction};
pub use report::{
    tax_report, year_options, DevoteeDirectory, DevoteeLookup, EntryReport, ExcludedRows,
    InterestReport, TaxReport, YearOption, ALL_YEARS_LABEL,
};
pub use books::{FeedUpdate, TempleBooks, View};
pub use export::{
    cell_value, escape_html, render_html, tabularize, CellValue, Column, DirectorySurface,
    ExportFormat, ExportedArtifact, Exporter, PagedDocument, PrintSurface, ReportKind, Table,
    Workbook,
};
pub use store::{
    count_documents, delete_document, import_seed, load_collection, open_database,
    setup_database, upsert_documents, SqliteSource,
};
pub use config::AppConfig;
pub use logging::init_logging;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

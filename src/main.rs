// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use temple_ledger::{
    import_seed, init_logging, open_database, AppConfig, ExportFormat, Exporter, ReportKind,
    SqliteSource, TempleBooks,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = AppConfig::load_or_default(None)?;
    init_logging(&config.log_level);

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let seed = args.get(2).context("Usage: temple-ledger import <seed.json>")?;
            run_import(&config, Path::new(seed))?;
        }
        Some("dashboard") => run_dashboard(&config)?,
        Some("ledger") => run_ledger(&config)?,
        Some("tax-report") => {
            let year = parse_year(args.get(2))?;
            run_tax_report(&config, year)?;
        }
        Some("export") => {
            let usage = "Usage: temple-ledger export <report> <xlsx|pdf|print|csv|txt> [year]";
            let kind: ReportKind = args.get(2).context(usage)?.parse()?;
            let format: ExportFormat = args.get(3).context(usage)?.parse()?;
            let year = parse_year(args.get(4))?;
            run_export(&config, kind, format, year)?;
        }
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown command: {}", other);
        }
        None => run_ui_mode(&config)?,
    }

    Ok(())
}

fn print_usage() {
    println!("🛕 Temple Ledger {}", temple_ledger::VERSION);
    println!();
    println!("Usage:");
    println!("  temple-ledger                              Interactive dashboard");
    println!("  temple-ledger import <seed.json>           Load documents into the store");
    println!("  temple-ledger dashboard                    Dashboard totals");
    println!("  temple-ledger ledger                       Overall transactions");
    println!("  temple-ledger tax-report [year]            Tax report (active devotees)");
    println!("  temple-ledger export <report> <fmt> [year] Export a report (xlsx|pdf|print|csv|txt)");
    println!();
    let reports: Vec<&str> = ReportKind::ALL.iter().map(|k| k.file_stem()).collect();
    println!("Reports: {}", reports.join(", "));
}

fn parse_year(arg: Option<&String>) -> Result<Option<i32>> {
    arg.map(|y| y.parse::<i32>().with_context(|| format!("Invalid year: {}", y)))
        .transpose()
}

fn load_books(config: &AppConfig) -> Result<TempleBooks> {
    let source = SqliteSource::open(&config.database_path)?;
    let books = TempleBooks::load(&source);

    for collection in books.unavailable() {
        eprintln!("⚠️  {} unavailable, shown as empty", collection);
    }
    Ok(books)
}

fn run_import(config: &AppConfig, seed: &Path) -> Result<()> {
    println!("🗄️  Importing documents");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_database(&config.database_path)?;
    println!("✓ Database ready at {} (WAL mode)", config.database_path.display());

    let imported = import_seed(&conn, seed)?;
    for (collection, count) in &imported {
        println!("✓ {:<18} {:>6} documents", collection.name(), count);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Imported {} documents", imported.values().sum::<usize>());
    Ok(())
}

fn run_dashboard(config: &AppConfig) -> Result<()> {
    let books = load_books(config)?;
    let d = books.dashboard();
    let net = books.net_position();

    println!("📊 Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Devotees        {:>12}", d.devotees_count);
    println!("  Villages        {:>12}", d.villages_count);
    println!("  Tax collected   {:>12.2}", d.tax_total);
    println!("  Donations       {:>12.2}", d.donation_total);
    println!("  Interest        {:>12.2}", d.interest_total);
    println!("  Expenses        {:>12.2}", d.expense_total);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Net position    {:>12.2}", net.net);
    Ok(())
}

fn run_ledger(config: &AppConfig) -> Result<()> {
    let books = load_books(config)?;
    let ledger = books.ledger();

    println!("📒 Overall Transactions ({})", ledger.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for tx in &ledger {
        println!("  {:<12} {:<9} {:<28} {:>12.2}", tx.date, tx.kind.as_str(), tx.name, tx.amount);
    }

    let net = books.net_position();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  Tax {:.2} + Donations {:.2} - Payments {:.2} = Net {:.2}",
        net.total_tax, net.total_donations, net.total_payments, net.net
    );
    Ok(())
}

fn run_tax_report(config: &AppConfig, year: Option<i32>) -> Result<()> {
    let books = load_books(config)?;
    let report = books.tax_report(year);

    let label = year.map(|y| y.to_string()).unwrap_or_else(|| "All Years".to_string());
    println!("🧾 Tax Report - {}", label);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for entry in &report.entries {
        println!(
            "  {:<24} {:<16} {:>6} {:>10.2}  {}",
            entry.devotee_name,
            entry.village_name,
            entry.year,
            entry.amount,
            if entry.paid { "Paid" } else { "Pending" }
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Paid {:.2} | Pending {:.2}", report.total_paid, report.total_pending);

    if report.excluded.total() > 0 {
        println!(
            "  Hidden: {} other year, {} inactive devotee, {} unknown devotee",
            report.excluded.other_year,
            report.excluded.inactive_devotee,
            report.excluded.unresolved_devotee
        );
    }
    Ok(())
}

fn run_export(
    config: &AppConfig,
    kind: ReportKind,
    format: ExportFormat,
    year: Option<i32>,
) -> Result<()> {
    let books = load_books(config)?;
    let exporter = Exporter::new(&config.export_dir, config.rows_per_page);

    let artifact = exporter.export_table(kind, format, books.table(kind, year))?;

    match artifact.path {
        Some(path) => println!("✅ {} → {}", kind.title(), path.display()),
        None => println!("✅ {} sent to printer", kind.title()),
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    println!("🖥️  Loading Temple Ledger...\n");

    let books = load_books(config)?;
    let exporter = Exporter::new(&config.export_dir, config.rows_per_page);

    let mut app = ui::App::new(books, exporter, Some(config.database_path.clone()));
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: temple-ledger help");
    std::process::exit(1);
}

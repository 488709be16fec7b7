use anyhow::{anyhow, bail, Context};
use colored::Colorize;

use tll_catalog::{Tool, ToolDraft, ToolPatch};
use tll_ledger::{
    AuditReport, ErrorKind, InventoryReport, LedgerAuditor, LedgerConfig, LedgerError,
    LendingEngine, Transaction,
};
use tll_types::ToolStatus;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let engine = LendingEngine::open(&cli.data_dir, LedgerConfig::default())
        .map_err(present)
        .with_context(|| format!("opening ledger in {}", cli.data_dir.display()))?;

    match cli.command {
        Command::Add(args) => cmd_add(&engine, args, &cli.format),
        Command::List(_) => cmd_list(&engine, &cli.format),
        Command::Show(args) => cmd_show(&engine, args, &cli.format),
        Command::Update(args) => cmd_update(&engine, args, &cli.format),
        Command::Delete(args) => cmd_delete(&engine, args),
        Command::Borrow(args) => cmd_borrow(&engine, args, &cli.format),
        Command::Return(args) => cmd_return(&engine, args, &cli.format),
        Command::History(args) => cmd_history(&engine, args, &cli.format),
        Command::Outstanding(args) => cmd_outstanding(&engine, args, &cli.format),
        Command::Search(args) => cmd_search(&engine, args, &cli.format),
        Command::Report(_) => cmd_report(&engine, &cli.format),
        Command::Audit(_) => cmd_audit(&engine, &cli.format),
        Command::Clear(args) => cmd_clear(&engine, args),
    }
}

/// Prefix ledger failures with their class so operators can tell a typo
/// from a conflict from a storage problem at a glance.
fn present(error: LedgerError) -> anyhow::Error {
    let label = match error.kind() {
        ErrorKind::Validation => "invalid input",
        ErrorKind::NotFound => "not found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Busy => "busy, try again",
        ErrorKind::Storage => "storage failure",
    };
    anyhow!("{label}: {error}")
}

fn cmd_add(engine: &LendingEngine, args: AddArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let tool = engine
        .create_tool(ToolDraft {
            name: args.name,
            category: args.category,
            condition: args.condition,
            total_quantity: args.quantity,
            location: args.location,
        })
        .map_err(present)?;

    match format {
        OutputFormat::Json => print_json(&tool)?,
        OutputFormat::Text => {
            println!(
                "{} Added tool {} {}",
                "✓".green().bold(),
                tool.id.to_string().yellow(),
                tool.name.bold()
            );
            print_tool(&tool);
        }
    }
    Ok(())
}

fn cmd_list(engine: &LendingEngine, format: &OutputFormat) -> anyhow::Result<()> {
    let tools = engine.list_tools().map_err(present)?;
    print_tools(&tools, format)
}

fn cmd_show(engine: &LendingEngine, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let tool = engine.tool(args.id).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&tool)?,
        OutputFormat::Text => {
            println!("Tool {} {}", tool.id.to_string().yellow(), tool.name.bold());
            print_tool(&tool);
        }
    }
    Ok(())
}

fn cmd_update(
    engine: &LendingEngine,
    args: UpdateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let patch = ToolPatch {
        name: args.name,
        category: args.category,
        condition: args.condition,
        total_quantity: args.quantity,
        location: args.location,
    };
    if patch.is_empty() {
        bail!("nothing to update: supply at least one field");
    }

    let tool = engine.update_tool(args.id, &patch).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&tool)?,
        OutputFormat::Text => {
            println!(
                "{} Updated tool {}",
                "✓".green().bold(),
                tool.id.to_string().yellow()
            );
            print_tool(&tool);
        }
    }
    Ok(())
}

fn cmd_delete(engine: &LendingEngine, args: DeleteArgs) -> anyhow::Result<()> {
    engine.delete_tool(args.id).map_err(present)?;
    println!(
        "{} Deleted tool {}",
        "✓".green().bold(),
        args.id.to_string().yellow()
    );
    Ok(())
}

fn cmd_borrow(
    engine: &LendingEngine,
    args: BorrowArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let transaction = engine.borrow(args.id, &args.borrower).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&transaction)?,
        OutputFormat::Text => {
            let remaining = engine.tool(args.id).map_err(present)?.available_quantity;
            println!(
                "{} Tool {} out to {} (loan {}), {} left on the shelf",
                "✓".green().bold(),
                args.id.to_string().yellow(),
                transaction.borrower.to_string().bold(),
                transaction.id.to_string().yellow(),
                remaining
            );
        }
    }
    Ok(())
}

fn cmd_return(
    engine: &LendingEngine,
    args: ReturnArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let transaction = engine.return_tool(args.id, &args.borrower).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&transaction)?,
        OutputFormat::Text => {
            println!(
                "{} Tool {} returned by {} (loan {} closed)",
                "✓".green().bold(),
                args.id.to_string().yellow(),
                transaction.borrower.to_string().bold(),
                transaction.id.to_string().yellow()
            );
        }
    }
    Ok(())
}

fn cmd_history(
    engine: &LendingEngine,
    args: HistoryArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let rows = engine.history(args.id).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No loans recorded for tool {}.", args.id);
                return Ok(());
            }
            println!("History of tool {}:", args.id.to_string().yellow());
            for transaction in &rows {
                print_transaction(transaction);
            }
        }
    }
    Ok(())
}

fn cmd_outstanding(
    engine: &LendingEngine,
    args: OutstandingArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let rows = engine.outstanding(&args.borrower).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("{} has nothing out.", args.borrower.to_string().bold());
                return Ok(());
            }
            println!("Open loans held by {}:", args.borrower.to_string().bold());
            for transaction in &rows {
                print_transaction(transaction);
            }
        }
    }
    Ok(())
}

fn cmd_search(
    engine: &LendingEngine,
    args: SearchArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let tools = engine.search_tools(&args.keyword).map_err(present)?;
    if tools.is_empty() && matches!(format, OutputFormat::Text) {
        println!("No tools match {:?}.", args.keyword);
        return Ok(());
    }
    print_tools(&tools, format)
}

fn cmd_report(engine: &LendingEngine, format: &OutputFormat) -> anyhow::Result<()> {
    let report = InventoryReport::build(engine).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!(
                "Inventory: {} tool(s), {} open loan(s)",
                report.total_tools.to_string().bold(),
                report.total_open_loans.to_string().bold()
            );
            for row in &report.rows {
                println!(
                    "  {:>4}  {:<24} {:<16} {:<5} {:>3}/{:<3}  {}, {} open",
                    row.id.to_string().yellow(),
                    row.name,
                    row.category,
                    row.condition,
                    row.available_quantity,
                    row.total_quantity,
                    status_cell(row.status),
                    row.open_loans
                );
            }
        }
    }
    Ok(())
}

fn cmd_audit(engine: &LendingEngine, format: &OutputFormat) -> anyhow::Result<()> {
    let report = LedgerAuditor::verify(engine).map_err(present)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_audit(&report),
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(anyhow!(
            "audit found {} violation(s)",
            report.violations.len()
        ))
    }
}

fn cmd_clear(engine: &LendingEngine, args: ClearArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("refusing to wipe the ledger: pass --yes to confirm");
    }
    engine.clear_all().map_err(present)?;
    println!("{} Ledger cleared.", "✓".green().bold());
    Ok(())
}

// ---- rendering ----

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tool(tool: &Tool) {
    println!("  Category:  {}", tool.category);
    println!("  Condition: {}", tool.condition.to_string().cyan());
    println!(
        "  Units:     {} of {} on the shelf ({})",
        tool.available_quantity,
        tool.total_quantity,
        status_cell(tool.status())
    );
    if !tool.location.is_empty() {
        println!("  Location:  {}", tool.location);
    }
}

fn print_tools(tools: &[Tool], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&tools)?,
        OutputFormat::Text => {
            if tools.is_empty() {
                println!("The catalog is empty.");
                return Ok(());
            }
            for tool in tools {
                println!(
                    "  {:>4}  {:<24} {:<16} {:<5} {:>3}/{:<3} {}",
                    tool.id.to_string().yellow(),
                    tool.name,
                    tool.category,
                    tool.condition,
                    tool.available_quantity,
                    tool.total_quantity,
                    status_cell(tool.status())
                );
            }
        }
    }
    Ok(())
}

fn print_transaction(transaction: &Transaction) {
    let when = transaction.borrowed_at.format("%Y-%m-%d %H:%M:%S");
    match transaction.returned_at {
        Some(returned_at) => println!(
            "  {}  {}  borrowed {}  returned {}",
            transaction.id.to_string().yellow(),
            transaction.borrower.to_string().bold(),
            when,
            returned_at.format("%Y-%m-%d %H:%M:%S").to_string().green()
        ),
        None => println!(
            "  {}  {}  borrowed {}  {}",
            transaction.id.to_string().yellow(),
            transaction.borrower.to_string().bold(),
            when,
            "still out".red()
        ),
    }
}

fn print_audit(report: &AuditReport) {
    if report.is_clean() {
        println!("{} Ledger audit clean", "✓".green().bold());
    } else {
        println!("{} Ledger audit failed", "✗".red().bold());
    }
    println!(
        "  Checked: {} tool(s), {} transaction(s)",
        report.tools_checked, report.transactions_checked
    );
    println!(
        "  Availability: {}",
        flag_cell(report.availability_consistent, "consistent", "inconsistent")
    );
    println!("  Open loans:   {}", flag_cell(report.loans_unique, "unique", "duplicated"));
    println!("  References:   {}", flag_cell(report.references_resolved, "resolved", "dangling"));
    println!("  Timestamps:   {}", flag_cell(report.timestamps_ordered, "ordered", "inverted"));
    println!("  Ids:          {}", flag_cell(report.ids_monotonic, "monotonic", "out of order"));
    for violation in &report.violations {
        println!("  {} {}", "✗".red(), violation.description);
    }
}

fn flag_cell(ok: bool, good: &'static str, bad: &'static str) -> colored::ColoredString {
    if ok {
        good.green()
    } else {
        bad.red()
    }
}

fn status_cell(status: ToolStatus) -> colored::ColoredString {
    match status {
        ToolStatus::Available => "available".green(),
        ToolStatus::Unavailable => "unavailable".red(),
    }
}

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use tll_types::{BorrowerId, Condition, ToolId};

#[derive(Parser)]
#[command(
    name = "tll",
    about = "Tool Lending Ledger: shared tool catalog, loans, and audits",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the ledger journal.
    #[arg(long, global = true, default_value = ".tll")]
    pub data_dir: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a tool to the catalog
    Add(AddArgs),
    /// List every tool
    List(ListArgs),
    /// Show one tool
    Show(ShowArgs),
    /// Update fields of a tool
    Update(UpdateArgs),
    /// Delete a tool with no open loans
    Delete(DeleteArgs),
    /// Check a tool out to a borrower
    Borrow(BorrowArgs),
    /// Check a borrowed tool back in
    Return(ReturnArgs),
    /// Show a tool's full lending history
    History(HistoryArgs),
    /// Show a borrower's open loans
    Outstanding(OutstandingArgs),
    /// Search tools by name or category
    Search(SearchArgs),
    /// Inventory overview with open-loan counts
    Report(ReportArgs),
    /// Cross-check the catalog against the transaction log
    Audit(AuditArgs),
    /// Wipe the entire ledger
    Clear(ClearArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Tool name
    pub name: String,
    #[arg(short, long)]
    pub category: String,
    #[arg(long, default_value = "good", value_parser = Condition::from_str)]
    pub condition: Condition,
    #[arg(short, long, default_value = "1")]
    pub quantity: u32,
    #[arg(short, long, default_value = "")]
    pub location: String,
}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(value_parser = ToolId::from_str)]
    pub id: ToolId,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(value_parser = ToolId::from_str)]
    pub id: ToolId,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    #[arg(long, value_parser = Condition::from_str)]
    pub condition: Option<Condition>,
    #[arg(short, long)]
    pub quantity: Option<u32>,
    #[arg(short, long)]
    pub location: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[arg(value_parser = ToolId::from_str)]
    pub id: ToolId,
}

#[derive(Args)]
pub struct BorrowArgs {
    #[arg(value_parser = ToolId::from_str)]
    pub id: ToolId,
    #[arg(value_parser = BorrowerId::from_str)]
    pub borrower: BorrowerId,
}

#[derive(Args)]
pub struct ReturnArgs {
    #[arg(value_parser = ToolId::from_str)]
    pub id: ToolId,
    #[arg(value_parser = BorrowerId::from_str)]
    pub borrower: BorrowerId,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(value_parser = ToolId::from_str)]
    pub id: ToolId,
}

#[derive(Args)]
pub struct OutstandingArgs {
    #[arg(value_parser = BorrowerId::from_str)]
    pub borrower: BorrowerId,
}

#[derive(Args)]
pub struct SearchArgs {
    pub keyword: String,
}

#[derive(Args)]
pub struct ReportArgs {}

#[derive(Args)]
pub struct AuditArgs {}

#[derive(Args)]
pub struct ClearArgs {
    /// Confirm wiping every tool and transaction
    #[arg(long)]
    pub yes: bool,
}

//! Clap derive structures for the `cardshop` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use rust_decimal::Decimal;

use cardshop_core::OrderStatus;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cardshop -- inventory, orders and staff for a trading-card storefront
#[derive(Debug, Parser)]
#[command(
    name = "cardshop",
    version,
    about = "Manage a trading-card storefront from the command line",
    long_about = "Browse and edit the card inventory, purchase orders and staff of a\n\
        cardshop storefront service.\n\n\
        Edits are applied locally first and rolled back if the service refuses them.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service profile to use
    #[arg(long, short = 'p', env = "CARDSHOP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Storefront service URL (overrides profile)
    #[arg(long, short = 's', env = "CARDSHOP_SERVICE", global = true)]
    pub service: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CARDSHOP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CARDSHOP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CARDSHOP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one key per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and edit the card inventory
    #[command(alias = "c")]
    Cards(CardsArgs),

    /// Manage purchase orders
    #[command(alias = "o")]
    Orders(OrdersArgs),

    /// Manage staff
    #[command(alias = "w")]
    Workers(WorkersArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Cards ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CardsArgs {
    #[command(subcommand)]
    pub command: CardsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CardsCommand {
    /// List cached cards, optionally narrowed
    #[command(alias = "ls")]
    List {
        /// Case-insensitive match on name, set or type
        #[arg(long)]
        query: Option<String>,

        /// Only cards with stock at or below this level
        #[arg(long)]
        low_stock: Option<u32>,

        /// Only cards from this set
        #[arg(long)]
        set: Option<String>,

        /// Only cards with stock on hand
        #[arg(long)]
        in_stock: bool,
    },

    /// Show one card
    Show {
        /// Collector number
        number: u32,
        /// Set code
        set: String,
    },

    /// Search the service's catalogue (not just the cache)
    Search {
        /// Search text
        query: String,
    },

    /// Add a card to the inventory
    Add {
        number: u32,
        set: String,

        /// Card name
        #[arg(long)]
        name: String,

        /// Type line (e.g. "Instant", "Artifact")
        #[arg(long = "type")]
        card_type: Option<String>,

        /// Mana value
        #[arg(long, default_value = "0")]
        mana_value: u32,

        /// Unit price
        #[arg(long)]
        price: Decimal,

        /// Copies on hand
        #[arg(long, default_value = "0")]
        stock: u32,
    },

    /// Set the stock level of a card
    SetStock { number: u32, set: String, stock: u32 },

    /// Set the unit price of a card
    SetPrice {
        number: u32,
        set: String,
        price: Decimal,
    },

    /// Remove a card from the inventory
    #[command(alias = "rm")]
    Delete { number: u32, set: String },
}

// ── Orders ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List cached orders, newest first
    #[command(alias = "ls")]
    List {
        /// Case-insensitive match on id, status or customer email
        #[arg(long)]
        query: Option<String>,

        /// Only orders in this status
        #[arg(long)]
        status: Option<OrderStatus>,

        /// Only orders assigned to this employee
        #[arg(long)]
        employee: Option<u64>,

        /// Only pending or paid orders
        #[arg(long, conflicts_with = "status")]
        active: bool,
    },

    /// Show one order with its items
    Show { id: u64 },

    /// Open a new order under the next free id
    Create {
        /// Customer email
        #[arg(long)]
        email: String,

        /// Assigned employee
        #[arg(long)]
        employee: Option<u64>,

        /// Initial status
        #[arg(long, default_value = "pending")]
        status: OrderStatus,
    },

    /// Change an order's status
    SetStatus { id: u64, status: OrderStatus },

    /// Assign an order to an employee
    Assign { id: u64, employee: u64 },

    /// Add a card to an order
    AddItem {
        id: u64,
        number: u32,
        set: String,

        /// Copies
        #[arg(long, default_value = "1")]
        quantity: u32,

        /// Unit price (defaults to the card's current price)
        #[arg(long)]
        price: Option<Decimal>,
    },

    /// Remove a card from an order
    RemoveItem { id: u64, number: u32, set: String },

    /// Delete an order
    #[command(alias = "rm")]
    Delete { id: u64 },
}

// ── Workers ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WorkersArgs {
    #[command(subcommand)]
    pub command: WorkersCommand,
}

#[derive(Debug, Subcommand)]
pub enum WorkersCommand {
    /// List staff
    #[command(alias = "ls")]
    List {
        /// Case-insensitive match on id, name, email or role
        #[arg(long)]
        query: Option<String>,

        /// Only staff with this role
        #[arg(long)]
        role: Option<String>,
    },

    /// Show one worker with their order workload
    Show { id: u64 },

    /// Add a worker under the next free employee id
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
    },

    /// Change a worker's details
    Update {
        id: u64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },

    /// Remove a worker (refused while they have active orders)
    #[command(alias = "rm")]
    Delete {
        id: u64,

        /// Delete even if pending or paid orders are assigned
        #[arg(long)]
        force: bool,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration
    Show,

    /// Write a profile to the config file
    Init {
        /// Storefront service URL
        #[arg(long, default_value = cardshop_core::DEFAULT_SERVICE_URL)]
        service_url: String,

        /// Reload interval in seconds (0 = never)
        #[arg(long)]
        refresh_interval: Option<u64>,

        /// Deadline for one edit, in seconds
        #[arg(long)]
        mutation_timeout: Option<u64>,

        /// Make this the default profile
        #[arg(long)]
        set_default: bool,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

//! Command dispatch: bridges CLI args -> storefront operations -> output formatting.

pub mod cards;
pub mod config_cmd;
pub mod orders;
pub mod util;
pub mod workers;

use cardshop_core::Storefront;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    storefront: &Storefront,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Cards(args) => cards::handle(storefront, args, global).await,
        Command::Orders(args) => orders::handle(storefront, args, global).await,
        Command::Workers(args) => workers::handle(storefront, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}

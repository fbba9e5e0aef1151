//! Shared helpers for command handlers.

use std::io::IsTerminal;

use cardshop_core::Filter;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// A filter that passes only items every one of `filters` accepts.
pub struct AllOf<F>(pub Vec<F>);

impl<T, F: Filter<T>> Filter<T> for AllOf<F> {
    fn matches(&self, item: &T) -> bool {
        self.0.iter().all(|f| f.matches(item))
    }
}

/// Placeholder for absent optional values in detail views.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardshop_core::{Order, OrderFilter, OrderStatus};

    #[test]
    fn all_of_requires_every_filter() {
        let order = Order::new(5001, "sara@mtgshop.com", OrderStatus::Paid).with_employee(101);
        let both = AllOf(vec![OrderFilter::Active, OrderFilter::ByEmployee(101)]);
        assert!(both.matches(&order));

        let wrong = AllOf(vec![OrderFilter::Active, OrderFilter::ByEmployee(7)]);
        assert!(!wrong.matches(&order));

        assert!(AllOf::<OrderFilter>(Vec::new()).matches(&order));
    }

    #[test]
    fn or_dash_fills_gaps() {
        assert_eq!(or_dash(None::<u64>), "-");
        assert_eq!(or_dash(Some(7)), "7");
    }
}

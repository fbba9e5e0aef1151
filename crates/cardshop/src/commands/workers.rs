//! Staff command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use cardshop_core::{Storefront, Worker, WorkerFilter, WorkerPatch};

use crate::cli::{GlobalOpts, WorkersArgs, WorkersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WorkerRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
}

impl From<&Arc<Worker>> for WorkerRow {
    fn from(w: &Arc<Worker>) -> Self {
        Self {
            id: w.employee_id,
            name: w.full_name(),
            email: w.email.clone(),
            role: w.role.clone(),
        }
    }
}

/// A worker plus the workload derived from the order cache.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkerDetail {
    #[serde(flatten)]
    worker: Worker,
    order_count: usize,
    has_active_orders: bool,
}

fn detail(d: &WorkerDetail) -> String {
    let w = &d.worker;
    [
        format!("Worker: {}", w.employee_id),
        format!("Name:   {}", w.full_name()),
        format!("Email:  {}", w.email),
        format!("Role:   {}", w.role),
        format!(
            "Orders: {}{}",
            d.order_count,
            if d.has_active_orders { " (some open)" } else { "" }
        ),
    ]
    .join("\n")
}

fn lookup(storefront: &Storefront, id: u64) -> Result<Arc<Worker>, CliError> {
    storefront
        .workers()
        .get(&id)
        .ok_or_else(|| CliError::not_found("worker", id))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    storefront: &Storefront,
    args: WorkersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WorkersCommand::List { query, role } => {
            let mut view = storefront
                .workers()
                .view()
                .with_query(query.unwrap_or_default());
            if let Some(role) = role {
                view = view.with_filter(WorkerFilter::ByRole(role));
            }
            let snap = view.current();
            let out = output::render_list(
                global.output,
                snap.as_slice(),
                |w| WorkerRow::from(w),
                |w| w.employee_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WorkersCommand::Show { id } => {
            let worker = lookup(storefront, id)?;
            let info = WorkerDetail {
                worker: Worker::clone(&worker),
                order_count: storefront.order_count_for_worker(id),
                has_active_orders: storefront.has_active_orders(id),
            };
            let out = output::render_single(global.output, &info, detail, |d| {
                d.worker.employee_id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WorkersCommand::Add {
            first_name,
            last_name,
            email,
            role,
        } => {
            let worker = Worker {
                employee_id: storefront.next_employee_id()?,
                first_name,
                last_name,
                email,
                role,
            };
            let saved = storefront.workers().create(worker).await?;
            if !global.quiet {
                output::print_output(&saved.employee_id.to_string(), false);
            }
            Ok(())
        }

        WorkersCommand::Update {
            id,
            first_name,
            last_name,
            email,
            role,
        } => {
            lookup(storefront, id)?;
            let patch = WorkerPatch {
                first_name,
                last_name,
                email,
                role,
            };
            let saved = storefront.workers().update(id, patch).await?;
            output::print_done(
                &format!("Worker {} ({}) updated", saved.employee_id, saved.full_name()),
                global.quiet,
            );
            Ok(())
        }

        WorkersCommand::Delete { id, force } => {
            let worker = lookup(storefront, id)?;
            if !force && storefront.has_active_orders(id) {
                return Err(CliError::Conflict {
                    action: "delete".into(),
                    resource_type: "worker".into(),
                    identifier: id.to_string(),
                    reason: "they still have pending or paid orders (use --force)".into(),
                });
            }
            if !util::confirm(
                &format!("Delete worker {id} ({})?", worker.full_name()),
                global.yes,
            )? {
                return Ok(());
            }
            storefront.workers().delete(id).await?;
            output::print_done(&format!("Worker {id} deleted"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_for(active: bool) -> WorkerDetail {
        WorkerDetail {
            worker: Worker {
                employee_id: 101,
                first_name: "Kai".into(),
                last_name: "Moreno".into(),
                email: "kai@mtgshop.com".into(),
                role: "Sales".into(),
            },
            order_count: 3,
            has_active_orders: active,
        }
    }

    #[test]
    fn detail_mentions_open_work() {
        assert!(detail(&detail_for(true)).contains("Orders: 3 (some open)"));
        assert!(detail(&detail_for(false)).ends_with("Orders: 3"));
    }

    #[test]
    fn json_detail_is_flat() {
        let value = serde_json::to_value(detail_for(false)).unwrap_or_default();
        assert_eq!(value["employeeId"], 101);
        assert_eq!(value["orderCount"], 3);
        assert_eq!(value["hasActiveOrders"], false);
    }
}

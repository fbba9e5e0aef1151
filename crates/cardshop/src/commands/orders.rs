//! Order command handlers.

use std::sync::Arc;

use tabled::Tabled;

use cardshop_core::{
    CardKey, Order, OrderFilter, OrderItem, OrderPatch, OrderStatus, Storefront,
};

use crate::cli::{GlobalOpts, OrdersArgs, OrdersCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, AllOf};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Employee")]
    employee: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Units")]
    units: u64,
    #[tabled(rename = "Total")]
    total: String,
}

fn order_row(o: &Arc<Order>, color: bool) -> OrderRow {
    OrderRow {
        id: o.order_id,
        date: o
            .order_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default(),
        customer: o.customer_email.clone(),
        employee: o.employee_id.map(|e| e.to_string()).unwrap_or_default(),
        status: output::paint_status(o.status, color),
        units: o.unit_count(),
        total: o.total_price().to_string(),
    }
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Unit")]
    unit_price: String,
    #[tabled(rename = "Line")]
    line_total: String,
}

fn detail(o: &Order, color: bool) -> String {
    let header = [
        format!("Order:    {}", o.order_id),
        format!("Customer: {}", o.customer_email),
        format!("Employee: {}", util::or_dash(o.employee_id)),
        format!("Status:   {}", output::paint_status(o.status, color)),
        format!(
            "Date:     {}",
            util::or_dash(o.order_date.map(|d| d.format("%Y-%m-%d %H:%M:%S")))
        ),
        format!("Total:    {}", o.total_price()),
    ]
    .join("\n");

    if o.items().is_empty() {
        return format!("{header}\n\n(no items)");
    }
    let rows: Vec<ItemRow> = o
        .items()
        .iter()
        .map(|i| ItemRow {
            item: i.label(),
            quantity: i.quantity(),
            unit_price: i.unit_price.to_string(),
            line_total: i.line_total().to_string(),
        })
        .collect();
    format!(
        "{header}\n\n{}",
        tabled::Table::new(rows).with(tabled::settings::Style::rounded())
    )
}

fn list_filters(status: Option<OrderStatus>, employee: Option<u64>, active: bool) -> Vec<OrderFilter> {
    let mut filters = Vec::new();
    if let Some(status) = status {
        filters.push(OrderFilter::ByStatus(status));
    }
    if let Some(employee) = employee {
        filters.push(OrderFilter::ByEmployee(employee));
    }
    if active {
        filters.push(OrderFilter::Active);
    }
    filters
}

fn lookup(storefront: &Storefront, id: u64) -> Result<Arc<Order>, CliError> {
    storefront
        .orders()
        .get(&id)
        .ok_or_else(|| CliError::not_found("order", id))
}

fn require_worker(storefront: &Storefront, employee_id: u64) -> Result<(), CliError> {
    match storefront.workers().get(&employee_id) {
        Some(_) => Ok(()),
        None => Err(CliError::not_found("worker", employee_id)),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    storefront: &Storefront,
    args: OrdersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        OrdersCommand::List {
            query,
            status,
            employee,
            active,
        } => {
            let view = storefront
                .orders()
                .view()
                .with_query(query.unwrap_or_default())
                .with_filter(AllOf(list_filters(status, employee, active)));
            let snap = view.current();
            let out = output::render_list(
                global.output,
                snap.as_slice(),
                |o| order_row(o, color),
                |o| o.order_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::Show { id } => {
            let order = lookup(storefront, id)?;
            let out = output::render_single(
                global.output,
                &*order,
                |o| detail(o, color),
                |o| o.order_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::Create {
            email,
            employee,
            status,
        } => {
            let mut order = Order::new(storefront.next_order_id()?, email, status)
                .with_date(chrono::Local::now().naive_local());
            if let Some(employee) = employee {
                require_worker(storefront, employee)?;
                order = order.with_employee(employee);
            }
            let saved = storefront.orders().create(order).await?;
            if global.quiet {
                return Ok(());
            }
            // The new id is the one thing scripts need back.
            output::print_output(&saved.order_id.to_string(), false);
            Ok(())
        }

        OrdersCommand::SetStatus { id, status } => {
            lookup(storefront, id)?;
            let saved = storefront
                .orders()
                .update(id, OrderPatch::status(status))
                .await?;
            output::print_done(
                &format!("Order {} is now {}", saved.order_id, saved.status),
                global.quiet,
            );
            Ok(())
        }

        OrdersCommand::Assign { id, employee } => {
            lookup(storefront, id)?;
            require_worker(storefront, employee)?;
            let patch = OrderPatch {
                employee_id: Some(Some(employee)),
                ..OrderPatch::default()
            };
            storefront.orders().update(id, patch).await?;
            output::print_done(
                &format!("Order {id} assigned to worker {employee}"),
                global.quiet,
            );
            Ok(())
        }

        OrdersCommand::AddItem {
            id,
            number,
            set,
            quantity,
            price,
        } => {
            lookup(storefront, id)?;
            let card = CardKey::new(number, set);
            let unit_price = match price {
                Some(price) => price,
                None => {
                    storefront
                        .cards()
                        .get(&card)
                        .ok_or_else(|| CliError::not_found("card", &card))?
                        .price
                }
            };
            let saved = storefront
                .orders()
                .update(id, OrderPatch::add_item(OrderItem::for_card(card, quantity, unit_price)))
                .await?;
            output::print_done(
                &format!("Order {id} total is now {}", saved.total_price()),
                global.quiet,
            );
            Ok(())
        }

        OrdersCommand::RemoveItem { id, number, set } => {
            let order = lookup(storefront, id)?;
            let card = CardKey::new(number, set);
            if !order.items().iter().any(|i| i.card.as_ref() == Some(&card)) {
                return Err(CliError::NotFound {
                    resource_type: "order item".into(),
                    identifier: card.to_string(),
                    list_command: format!("orders show {id}"),
                });
            }
            let saved = storefront
                .orders()
                .update(id, OrderPatch::remove_item(card))
                .await?;
            output::print_done(
                &format!("Order {id} total is now {}", saved.total_price()),
                global.quiet,
            );
            Ok(())
        }

        OrdersCommand::Delete { id } => {
            let order = lookup(storefront, id)?;
            if !util::confirm(
                &format!("Delete order {id} ({}, {})?", order.customer_email, order.status),
                global.yes,
            )? {
                return Ok(());
            }
            storefront.orders().delete(id).await?;
            output::print_done(&format!("Order {id} deleted"), global.quiet);
            Ok(())
        }
    }
}

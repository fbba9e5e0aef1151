//! Card inventory handlers.

use std::sync::Arc;

use tabled::Tabled;

use cardshop_core::{Card, CardFilter, CardKey, CardPatch, Storefront};

use crate::cli::{CardsArgs, CardsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{self, AllOf};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CardRow {
    #[tabled(rename = "#")]
    number: u32,
    #[tabled(rename = "Set")]
    set: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    card_type: String,
    #[tabled(rename = "MV")]
    mana_value: u32,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: String,
}

fn card_row(c: &Arc<Card>, color: bool) -> CardRow {
    CardRow {
        number: c.card_number,
        set: c.set_name.clone(),
        name: c.card_name.clone(),
        card_type: c.card_type.clone().unwrap_or_default(),
        mana_value: c.mana_value,
        price: c.price.to_string(),
        stock: output::paint_stock(c.stock, color),
    }
}

fn detail(c: &Card) -> String {
    [
        format!("Card:       {}", c.card_name),
        format!("Key:        {}", c.card_key()),
        format!("Type:       {}", util::or_dash(c.card_type.as_deref())),
        format!("Mana value: {}", c.mana_value),
        format!("Price:      {}", c.price),
        format!("Stock:      {}", c.stock),
    ]
    .join("\n")
}

fn list_filters(low_stock: Option<u32>, set: Option<String>, in_stock: bool) -> Vec<CardFilter> {
    let mut filters = Vec::new();
    if let Some(threshold) = low_stock {
        filters.push(CardFilter::LowStock(threshold));
    }
    if let Some(set) = set {
        filters.push(CardFilter::InSet(set));
    }
    if in_stock {
        filters.push(CardFilter::InStock);
    }
    filters
}

fn lookup(storefront: &Storefront, key: &CardKey) -> Result<Arc<Card>, CliError> {
    storefront
        .cards()
        .get(key)
        .ok_or_else(|| CliError::not_found("card", key))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    storefront: &Storefront,
    args: CardsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        CardsCommand::List {
            query,
            low_stock,
            set,
            in_stock,
        } => {
            let view = storefront
                .cards()
                .view()
                .with_query(query.unwrap_or_default())
                .with_filter(AllOf(list_filters(low_stock, set, in_stock)));
            let snap = view.current();
            let out = output::render_list(
                global.output,
                snap.as_slice(),
                |c| card_row(c, color),
                |c| c.card_key().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CardsCommand::Show { number, set } => {
            let card = lookup(storefront, &CardKey::new(number, set))?;
            let out = output::render_single(global.output, &*card, detail, |c| {
                c.card_key().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CardsCommand::Search { query } => {
            let found: Vec<Arc<Card>> = storefront
                .search_cards_remote(&query)
                .await?
                .into_iter()
                .map(Arc::new)
                .collect();
            let out = output::render_list(
                global.output,
                &found,
                |c| card_row(c, color),
                |c| c.card_key().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CardsCommand::Add {
            number,
            set,
            name,
            card_type,
            mana_value,
            price,
            stock,
        } => {
            let key = CardKey::new(number, set.clone());
            if storefront.cards().get(&key).is_some() {
                return Err(CliError::Conflict {
                    action: "add".into(),
                    resource_type: "card".into(),
                    identifier: key.to_string(),
                    reason: "already in the inventory".into(),
                });
            }
            let card = Card {
                card_number: number,
                set_name: set,
                card_name: name,
                card_type,
                mana_value,
                price,
                stock,
            };
            let saved = storefront.cards().create(card).await?;
            output::print_done(&format!("Card {} added", saved.card_key()), global.quiet);
            Ok(())
        }

        CardsCommand::SetStock { number, set, stock } => {
            let key = CardKey::new(number, set);
            lookup(storefront, &key)?;
            let saved = storefront
                .cards()
                .update(key, CardPatch::stock(stock))
                .await?;
            output::print_done(
                &format!("Stock of {} set to {}", saved.card_key(), saved.stock),
                global.quiet,
            );
            Ok(())
        }

        CardsCommand::SetPrice { number, set, price } => {
            let key = CardKey::new(number, set);
            lookup(storefront, &key)?;
            let saved = storefront
                .cards()
                .update(key, CardPatch::price(price))
                .await?;
            output::print_done(
                &format!("Price of {} set to {}", saved.card_key(), saved.price),
                global.quiet,
            );
            Ok(())
        }

        CardsCommand::Delete { number, set } => {
            let key = CardKey::new(number, set);
            let card = lookup(storefront, &key)?;
            if !util::confirm(
                &format!("Delete card {key} ({})?", card.card_name),
                global.yes,
            )? {
                return Ok(());
            }
            storefront.cards().delete(key.clone()).await?;
            output::print_done(&format!("Card {key} deleted"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardshop_core::Filter;
    use rust_decimal::Decimal;

    fn card(stock: u32, set: &str) -> Card {
        Card {
            card_number: 1,
            set_name: set.into(),
            card_name: "Black Lotus".into(),
            card_type: Some("Artifact".into()),
            mana_value: 0,
            price: Decimal::new(1_500_000, 2),
            stock,
        }
    }

    #[test]
    fn list_flags_combine() {
        let filters = AllOf(list_filters(Some(2), Some("leb".into()), true));
        assert!(filters.matches(&card(1, "LEB")));
        assert!(!filters.matches(&card(0, "LEB")));
        assert!(!filters.matches(&card(3, "LEB")));
        assert!(!filters.matches(&card(1, "LEA")));
    }

    #[test]
    fn no_flags_match_everything() {
        assert!(AllOf(list_filters(None, None, false)).matches(&card(0, "LEA")));
    }

    #[test]
    fn detail_shows_missing_type_as_dash() {
        let mut c = card(4, "LEB");
        c.card_type = None;
        let text = detail(&c);
        assert!(text.contains("Key:        1/LEB"));
        assert!(text.contains("Type:       -"));
    }
}

// ── Card domain types ──

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, SearchField, Searchable, require_text};
use crate::error::CoreError;

/// A card printing is identified by its collector number within a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardKey {
    pub card_number: u32,
    pub set_name: String,
}

impl CardKey {
    pub fn new(card_number: u32, set_name: impl Into<String>) -> Self {
        Self {
            card_number,
            set_name: set_name.into(),
        }
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.card_number, self.set_name)
    }
}

/// Parses `NUMBER/SET`. Everything after the first `/` is the set name.
impl FromStr for CardKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, set) = s
            .split_once('/')
            .ok_or_else(|| CoreError::validation(format!("expected NUMBER/SET, got {s:?}")))?;
        let card_number = number
            .trim()
            .parse()
            .map_err(|_| CoreError::validation(format!("invalid card number: {number:?}")))?;
        require_text(set, "set name")?;
        Ok(Self::new(card_number, set.trim()))
    }
}

/// A card in the shop's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_number: u32,
    pub set_name: String,
    pub card_name: String,
    pub card_type: Option<String>,
    pub mana_value: u32,
    pub price: Decimal,
    pub stock: u32,
}

impl Card {
    pub fn card_key(&self) -> CardKey {
        CardKey::new(self.card_number, self.set_name.clone())
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Partial update for a [`Card`]. The key fields are immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardPatch {
    pub card_name: Option<String>,
    pub card_type: Option<String>,
    pub mana_value: Option<u32>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
}

impl CardPatch {
    pub fn stock(stock: u32) -> Self {
        Self {
            stock: Some(stock),
            ..Self::default()
        }
    }

    pub fn price(price: Decimal) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Entity for Card {
    type Key = CardKey;
    type Patch = CardPatch;
    const KIND: &'static str = "card";

    fn key(&self) -> CardKey {
        self.card_key()
    }

    fn apply_patch(&mut self, patch: &CardPatch) {
        if let Some(name) = &patch.card_name {
            self.card_name.clone_from(name);
        }
        if let Some(card_type) = &patch.card_type {
            self.card_type = Some(card_type.clone());
        }
        if let Some(mana) = patch.mana_value {
            self.mana_value = mana;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        require_text(&self.card_name, "card name")?;
        require_text(&self.set_name, "set name")?;
        if self.price.is_sign_negative() {
            return Err(CoreError::validation("price must not be negative"));
        }
        Ok(())
    }

    fn validate_patch(patch: &CardPatch) -> Result<(), CoreError> {
        if patch.is_empty() {
            return Err(CoreError::validation("nothing to update"));
        }
        if let Some(name) = &patch.card_name {
            require_text(name, "card name")?;
        }
        if patch.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(CoreError::validation("price must not be negative"));
        }
        Ok(())
    }
}

fn card_name(card: &Card) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(card.card_name.as_str()))
}

fn set_name(card: &Card) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(card.set_name.as_str()))
}

fn card_type(card: &Card) -> Option<Cow<'_, str>> {
    card.card_type.as_deref().map(Cow::Borrowed)
}

const CARD_FIELDS: &[SearchField<Card>] = &[
    SearchField {
        name: "name",
        extract: card_name,
    },
    SearchField {
        name: "set",
        extract: set_name,
    },
    SearchField {
        name: "type",
        extract: card_type,
    },
];

impl Searchable for Card {
    fn search_fields() -> &'static [SearchField<Self>] {
        CARD_FIELDS
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bolt() -> Card {
        Card {
            card_number: 269,
            set_name: "ALP".into(),
            card_name: "Lightning Bolt".into(),
            card_type: Some("Instant".into()),
            mana_value: 1,
            price: dec!(2),
            stock: 120,
        }
    }

    #[test]
    fn key_round_trips_through_display() {
        let key: CardKey = "269/ALP".parse().unwrap();
        assert_eq!(key, bolt().key());
        assert_eq!(key.to_string(), "269/ALP");
    }

    #[test]
    fn key_keeps_slashes_in_set_name() {
        let key: CardKey = "7/Fourth Edition/EN".parse().unwrap();
        assert_eq!(key.set_name, "Fourth Edition/EN");
    }

    #[test]
    fn key_rejects_garbage() {
        assert!("bolt".parse::<CardKey>().is_err());
        assert!("x/ALP".parse::<CardKey>().is_err());
        assert!("1/ ".parse::<CardKey>().is_err());
    }

    #[test]
    fn patch_touches_only_set_fields() {
        let mut card = bolt();
        card.apply_patch(&CardPatch::stock(5));
        assert_eq!(card.stock, 5);
        assert_eq!(card.price, dec!(2));
        assert_eq!(card.card_name, "Lightning Bolt");
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut card = bolt();
        card.price = dec!(-1);
        assert!(card.validate().is_err());
        assert!(Card::validate_patch(&CardPatch::price(dec!(-0.01))).is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(Card::validate_patch(&CardPatch::default()).is_err());
    }
}

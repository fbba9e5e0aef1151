// ── Worker domain types ──

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, SearchField, Searchable, require_email, require_text};
use super::order::Order;
use crate::error::CoreError;

/// A member of staff who can be assigned orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub employee_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

impl Worker {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            _ => self.last_name.clone(),
        }
    }
}

/// Partial update for a [`Worker`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Entity for Worker {
    type Key = u64;
    type Patch = WorkerPatch;
    const KIND: &'static str = "worker";

    fn key(&self) -> u64 {
        self.employee_id
    }

    fn apply_patch(&mut self, patch: &WorkerPatch) {
        let fields = [
            (&mut self.first_name, &patch.first_name),
            (&mut self.last_name, &patch.last_name),
            (&mut self.email, &patch.email),
            (&mut self.role, &patch.role),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                field.clone_from(value);
            }
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        require_text(&self.first_name, "first name")?;
        require_email(&self.email, "email")?;
        require_text(&self.role, "role")
    }

    fn validate_patch(patch: &WorkerPatch) -> Result<(), CoreError> {
        if *patch == WorkerPatch::default() {
            return Err(CoreError::validation("nothing to update"));
        }
        if let Some(first) = &patch.first_name {
            require_text(first, "first name")?;
        }
        if let Some(email) = &patch.email {
            require_email(email, "email")?;
        }
        if let Some(role) = &patch.role {
            require_text(role, "role")?;
        }
        Ok(())
    }
}

fn employee_id(worker: &Worker) -> Option<Cow<'_, str>> {
    Some(Cow::Owned(worker.employee_id.to_string()))
}

fn first_name(worker: &Worker) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(worker.first_name.as_str()))
}

fn last_name(worker: &Worker) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(worker.last_name.as_str()))
}

fn email(worker: &Worker) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(worker.email.as_str()))
}

fn role(worker: &Worker) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(worker.role.as_str()))
}

const WORKER_FIELDS: &[SearchField<Worker>] = &[
    SearchField {
        name: "id",
        extract: employee_id,
    },
    SearchField {
        name: "first",
        extract: first_name,
    },
    SearchField {
        name: "last",
        extract: last_name,
    },
    SearchField {
        name: "email",
        extract: email,
    },
    SearchField {
        name: "role",
        extract: role,
    },
];

impl Searchable for Worker {
    fn search_fields() -> &'static [SearchField<Self>] {
        WORKER_FIELDS
    }
}

// ── Collection-level queries ─────────────────────────────────────────

/// Next free employee id: one past the highest known id (1 for none).
/// `None` once `u64::MAX` is taken.
pub fn next_employee_id<'a>(workers: impl IntoIterator<Item = &'a Worker>) -> Option<u64> {
    workers
        .into_iter()
        .map(|w| w.employee_id)
        .fold(0, u64::max)
        .checked_add(1)
}

/// Whether any order assigned to `employee_id` still needs work.
pub fn has_active_orders<'a>(orders: impl IntoIterator<Item = &'a Order>, employee_id: u64) -> bool {
    orders
        .into_iter()
        .any(|o| o.employee_id == Some(employee_id) && o.status.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::order::OrderStatus;

    fn kai() -> Worker {
        Worker {
            employee_id: 104,
            first_name: "Kai".into(),
            last_name: "Ito".into(),
            email: "kai.ito@mtgshop.com".into(),
            role: "Salesperson".into(),
        }
    }

    #[test]
    fn patch_only_overwrites_given_fields() {
        let mut worker = kai();
        worker.apply_patch(&WorkerPatch {
            role: Some("Manager".into()),
            ..WorkerPatch::default()
        });
        assert_eq!(worker.role, "Manager");
        assert_eq!(worker.first_name, "Kai");
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut worker = kai();
        worker.email = "kai.ito".into();
        assert!(worker.validate().is_err());
        assert!(
            Worker::validate_patch(&WorkerPatch {
                email: Some("@mtgshop.com".into()),
                ..WorkerPatch::default()
            })
            .is_err()
        );
    }

    #[test]
    fn full_name_skips_missing_parts() {
        let mut worker = kai();
        assert_eq!(worker.full_name(), "Kai Ito");
        worker.last_name.clear();
        assert_eq!(worker.full_name(), "Kai");
    }

    #[test]
    fn next_employee_id_starts_at_one() {
        assert_eq!(next_employee_id(std::iter::empty::<&Worker>()), Some(1));
        assert_eq!(next_employee_id([&kai()]), Some(105));
    }

    #[test]
    fn next_employee_id_is_none_at_the_top() {
        let mut last = kai();
        last.employee_id = u64::MAX;
        assert_eq!(next_employee_id([&kai(), &last]), None);
    }

    #[test]
    fn fulfilled_and_canceled_orders_are_not_active() {
        let done = Order::new(5001, "a@b.c", OrderStatus::Fulfilled).with_employee(104);
        let canceled = Order::new(5002, "a@b.c", OrderStatus::Canceled).with_employee(104);
        let other = Order::new(5003, "a@b.c", OrderStatus::Pending).with_employee(7);
        assert!(!has_active_orders([&done, &canceled, &other], 104));

        let paid = Order::new(5004, "a@b.c", OrderStatus::Paid).with_employee(104);
        assert!(has_active_orders([&done, &paid], 104));
    }
}

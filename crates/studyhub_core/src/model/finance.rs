//! Expense, savings goal and spending limit domain model.
//!
//! # Invariants
//! - `0 <= current_amount <= target_amount` for every stored savings goal.
//! - A spending limit is identified by its category; at most one per category.

use crate::model::RecordId;
use crate::store::{CollectionKey, CollectionRecord, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    School,
    Entertainment,
    Transport,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Food,
        ExpenseCategory::School,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Transport,
        ExpenseCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::School => "school",
            Self::Entertainment => "entertainment",
            Self::Transport => "transport",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::School => "School Supplies",
            Self::Entertainment => "Entertainment",
            Self::Transport => "Transportation",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: RecordId,
    pub amount: f64,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category: Option<ExpenseCategory>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Record for Expense {
    type Patch = ExpensePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: ExpensePatch) {
        if let Some(amount) = patch.amount.filter(|amount| is_valid_amount(*amount)) {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }

    fn validate(&self) -> Result<(), String> {
        check_amount("expense", &self.id, "amount", self.amount)
    }
}

impl CollectionRecord for Expense {
    const KEY: CollectionKey = CollectionKey::Expenses;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: RecordId,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
}

impl SavingsGoal {
    /// Fraction of the target reached, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.target_amount > 0.0 {
            (self.current_amount / self.target_amount).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavingsGoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
}

impl Record for SavingsGoal {
    type Patch = SavingsGoalPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: SavingsGoalPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(target) = patch.target_amount.filter(|target| is_valid_amount(*target)) {
            self.target_amount = target;
        }
        if let Some(current) = patch.current_amount.filter(|current| current.is_finite()) {
            self.current_amount = current;
        }
    }

    fn normalize(&mut self) {
        self.current_amount = clamp_goal_amount(self.current_amount, self.target_amount);
    }

    fn validate(&self) -> Result<(), String> {
        check_amount("goal", &self.id, "targetAmount", self.target_amount)
    }
}

impl CollectionRecord for SavingsGoal {
    const KEY: CollectionKey = CollectionKey::SavingsGoals;
}

/// Clamps a saved amount into `[0, target]`; non-finite input becomes 0.
pub fn clamp_goal_amount(amount: f64, target: f64) -> f64 {
    if !amount.is_finite() {
        return 0.0;
    }
    amount.min(target).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingLimit {
    pub category: ExpenseCategory,
    pub limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingLimitPatch {
    pub limit: Option<f64>,
}

impl Record for SpendingLimit {
    type Patch = SpendingLimitPatch;

    fn id(&self) -> &str {
        self.category.as_str()
    }

    fn apply_patch(&mut self, patch: SpendingLimitPatch) {
        if let Some(limit) = patch.limit.filter(|limit| is_valid_amount(*limit)) {
            self.limit = limit;
        }
    }

    fn validate(&self) -> Result<(), String> {
        check_amount("limit", self.category.as_str(), "limit", self.limit)
    }
}

impl CollectionRecord for SpendingLimit {
    const KEY: CollectionKey = CollectionKey::SpendingLimits;
}

/// Returns whether `amount` is a usable positive money value.
pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

fn check_amount(kind: &str, id: &str, field: &str, amount: f64) -> Result<(), String> {
    if is_valid_amount(amount) {
        Ok(())
    } else {
        Err(format!("{kind} `{id}` has invalid {field} {amount}"))
    }
}

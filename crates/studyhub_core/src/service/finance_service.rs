//! Expense, savings goal and spending limit use-case service.
//!
//! # Responsibility
//! - Record and delete expenses; aggregate them per month and category.
//! - Track savings goals with clamped progress.
//! - Keep per-category spending limits and report budget status.
//!
//! # Invariants
//! - Invalid input (non-positive or non-finite amounts, blank goal names)
//!   writes nothing.
//! - Goal amounts stay within `[0, target]`.

use crate::model::finance::{
    is_valid_amount, Expense, ExpenseCategory, ExpensePatch, SavingsGoal, SavingsGoalPatch,
    SpendingLimit, SpendingLimitPatch,
};
use crate::model::RecordId;
use crate::storage::KvStorage;
use crate::store::{Collection, ListQuery, Store, StoreResult};
use chrono::{Datelike, Months, NaiveDate};
use log::{debug, info};
use serde::Serialize;

/// Input for a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub category: ExpenseCategory,
    pub description: String,
    pub date: NaiveDate,
}

/// Spend for one category within one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub label: &'static str,
    pub total: f64,
}

/// Spend for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub total: f64,
}

/// Spend against a configured limit for one category and month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub category: ExpenseCategory,
    pub limit: f64,
    pub spent: f64,
    pub remaining: f64,
    pub over_limit: bool,
}

/// Finance service over the expenses, savings goals and spending limits
/// collections.
pub struct FinanceService<'s, S: KvStorage> {
    expenses: Collection<'s, S, Expense>,
    goals: Collection<'s, S, SavingsGoal>,
    limits: Collection<'s, S, SpendingLimit>,
}

impl<'s, S: KvStorage> FinanceService<'s, S> {
    pub fn new(store: &'s Store<S>) -> StoreResult<Self> {
        Ok(Self {
            expenses: store.collection()?,
            goals: store.collection()?,
            limits: store.collection()?,
        })
    }

    pub fn expenses(&self) -> &[Expense] {
        self.expenses.items()
    }

    pub fn goals(&self) -> &[SavingsGoal] {
        self.goals.items()
    }

    pub fn limits(&self) -> &[SpendingLimit] {
        self.limits.items()
    }

    /// Records an expense. Returns `None` without writing when the amount is
    /// not a finite positive number.
    pub fn add_expense(&mut self, input: NewExpense) -> StoreResult<Option<RecordId>> {
        if !is_valid_amount(input.amount) {
            debug!("event=expense_create module=service status=ignored reason=invalid_amount");
            return Ok(None);
        }
        let id = self.expenses.insert_new(|id| Expense {
            id,
            amount: input.amount,
            category: input.category,
            description: input.description,
            date: input.date,
        })?;
        info!(
            "event=expense_create module=service status=ok category={}",
            input.category.as_str()
        );
        Ok(Some(id))
    }

    pub fn update_expense(&mut self, id: &str, patch: ExpensePatch) -> StoreResult<bool> {
        self.expenses.update_by_id(id, patch)
    }

    pub fn delete_expense(&mut self, id: &str) -> StoreResult<bool> {
        self.expenses.remove_by_id(id)
    }

    /// Expenses dated in the month of `month`, newest first.
    pub fn expenses_in_month(&self, month: NaiveDate) -> Vec<Expense> {
        let query = ListQuery::new()
            .filter(|expense: &Expense| same_month(expense.date, month))
            .sort_by(|a: &Expense, b: &Expense| b.date.cmp(&a.date));
        self.expenses.list(&query)
    }

    /// Total spend in the month of `month`.
    pub fn monthly_total(&self, month: NaiveDate) -> f64 {
        self.expenses
            .items()
            .iter()
            .filter(|expense| same_month(expense.date, month))
            .map(|expense| expense.amount)
            .sum()
    }

    /// Per-category spend in the month of `month`, omitting categories with
    /// no spend.
    pub fn category_breakdown(&self, month: NaiveDate) -> Vec<CategoryTotal> {
        ExpenseCategory::ALL
            .into_iter()
            .map(|category| CategoryTotal {
                category,
                label: category.label(),
                total: self.category_spend(category, month),
            })
            .filter(|entry| entry.total > 0.0)
            .collect()
    }

    /// Totals for the `months` calendar months ending with the month of
    /// `today`, oldest first.
    pub fn recent_monthly_totals(&self, today: NaiveDate, months: u32) -> Vec<MonthTotal> {
        (0..months)
            .rev()
            .filter_map(|offset| today.checked_sub_months(Months::new(offset)))
            .map(|month| MonthTotal {
                year: month.year(),
                month: month.month(),
                total: self.monthly_total(month),
            })
            .collect()
    }

    /// Creates a savings goal starting at zero. Returns `None` without
    /// writing for a blank name or an invalid target.
    pub fn add_goal(&mut self, name: &str, target_amount: f64) -> StoreResult<Option<RecordId>> {
        let name = name.trim();
        if name.is_empty() || !is_valid_amount(target_amount) {
            debug!("event=goal_create module=service status=ignored reason=invalid_input");
            return Ok(None);
        }
        let id = self.goals.insert_new(|id| SavingsGoal {
            id,
            name: name.to_string(),
            target_amount,
            current_amount: 0.0,
        })?;
        Ok(Some(id))
    }

    /// Sets the saved amount of a goal, clamped to `[0, target]`.
    pub fn update_goal_amount(&mut self, id: &str, amount: f64) -> StoreResult<bool> {
        if !amount.is_finite() {
            return Ok(false);
        }
        self.goals.update_by_id(
            id,
            SavingsGoalPatch {
                current_amount: Some(amount),
                ..SavingsGoalPatch::default()
            },
        )
    }

    pub fn update_goal(&mut self, id: &str, patch: SavingsGoalPatch) -> StoreResult<bool> {
        self.goals.update_by_id(id, patch)
    }

    pub fn delete_goal(&mut self, id: &str) -> StoreResult<bool> {
        self.goals.remove_by_id(id)
    }

    /// Sets the monthly limit for `category`, replacing any previous one.
    /// Returns `false` without writing for an invalid limit.
    pub fn set_spending_limit(&mut self, category: ExpenseCategory, limit: f64) -> StoreResult<bool> {
        if !is_valid_amount(limit) {
            return Ok(false);
        }
        if self.limits.contains(category.as_str()) {
            return self.limits.update_by_id(
                category.as_str(),
                SpendingLimitPatch { limit: Some(limit) },
            );
        }
        self.limits.add(SpendingLimit { category, limit })?;
        Ok(true)
    }

    pub fn remove_spending_limit(&mut self, category: ExpenseCategory) -> StoreResult<bool> {
        self.limits.remove_by_id(category.as_str())
    }

    /// Spend against each configured limit in the month of `month`, in
    /// category order.
    pub fn budget_status(&self, month: NaiveDate) -> Vec<BudgetStatus> {
        let mut statuses: Vec<BudgetStatus> = self
            .limits
            .items()
            .iter()
            .map(|limit| {
                let spent = self.category_spend(limit.category, month);
                BudgetStatus {
                    category: limit.category,
                    limit: limit.limit,
                    spent,
                    remaining: (limit.limit - spent).max(0.0),
                    over_limit: spent > limit.limit,
                }
            })
            .collect();
        statuses.sort_by_key(|status| status.category);
        statuses
    }

    fn category_spend(&self, category: ExpenseCategory, month: NaiveDate) -> f64 {
        self.expenses
            .items()
            .iter()
            .filter(|expense| expense.category == category && same_month(expense.date, month))
            .map(|expense| expense.amount)
            .sum()
    }
}

/// Whether two dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

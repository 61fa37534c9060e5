//! Expense totals for the summary cards and the category breakdown.
//!
//! Amounts are summed with plain `f64` addition, as the hosted backend stores
//! them; rounding to cents happens only in [`format_amount`].

use std::collections::BTreeMap;

use crate::{
  date::CalendarDate,
  expense::{Expense, ExpenseCategory},
};

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
  pub start: CalendarDate,
  pub end:   CalendarDate,
}

impl DateWindow {
  /// The whole calendar month containing `date`.
  pub fn month_of(date: CalendarDate) -> Self {
    Self { start: date.first_of_month(), end: date.last_of_month() }
  }

  pub fn contains(&self, date: CalendarDate) -> bool {
    self.start <= date && date <= self.end
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
  /// Sum over every expense.
  pub total:        f64,
  /// Sum over expenses dated inside the window.
  pub window_total: f64,
  /// All-time sum per category; only categories with at least one expense
  /// appear.
  pub by_category:  BTreeMap<ExpenseCategory, f64>,
}

/// One slice of the proportional breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
  pub category: ExpenseCategory,
  pub amount:   f64,
  /// Fraction of the all-time total, in `0.0..=1.0`.
  pub share:    f64,
}

pub fn summarize(expenses: &[Expense], window: DateWindow) -> ExpenseSummary {
  let mut summary = ExpenseSummary {
    total:        0.0,
    window_total: 0.0,
    by_category:  BTreeMap::new(),
  };
  for expense in expenses {
    summary.total += expense.amount;
    if window.contains(expense.date) {
      summary.window_total += expense.amount;
    }
    *summary.by_category.entry(expense.category).or_insert(0.0) += expense.amount;
  }
  summary
}

impl ExpenseSummary {
  /// Categories with a positive total, largest first, with their share of
  /// the overall total.
  pub fn shares(&self) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = self
      .by_category
      .iter()
      .filter(|(_, amount)| **amount > 0.0)
      .map(|(category, amount)| CategoryShare {
        category: *category,
        amount:   *amount,
        share:    if self.total > 0.0 { amount / self.total } else { 0.0 },
      })
      .collect();
    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
  }
}

/// Two decimal places, for display only.
pub fn format_amount(amount: f64) -> String { format!("{amount:.2}") }

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Savings goals: `Active --target reached--> Completed --convert--> Converted`.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::{LedgerError, LedgerResult, RuleViolation, ValidationError};
use crate::ledger::{Ledger, NewEntry, adjust_balance, append, begin, load_account, load_goal, reject};
use crate::models::{
    AccountType, Conversion, GoalProgress, GoalStatus, Posting, SavingGoal, TransactionType,
};
use crate::registry::{ensure_account_slot, insert_account};
use crate::validation;

/// How to treat accumulated funds when deleting a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalDeletion {
    /// Only goals without contributions may be deleted.
    RequireEmpty,
    /// The caller confirmed that the goal's funds are forfeited.
    ForfeitFunds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionOutcome {
    pub posting: Posting,
    /// True when this contribution moved the goal from Active to Completed.
    pub completed: bool,
}

/// Marks an Active goal Completed once it holds its target. Returns whether
/// the transition happened in this call.
pub(crate) fn settle_completion(
    conn: &Connection,
    goal_id: i64,
    at: NaiveDateTime,
) -> LedgerResult<bool> {
    let changed = conn.execute(
        "UPDATE saving_goals SET status = 'Completed', completed_at = ?1
         WHERE id = ?2 AND status = 'Active' AND current_amount >= target_amount",
        params![at, goal_id],
    )?;
    Ok(changed == 1)
}

impl Ledger {
    pub fn create_goal(
        &mut self,
        user_id: i64,
        name: &str,
        target_amount: Decimal,
        linked_account_id: Option<i64>,
        deadline: Option<NaiveDate>,
    ) -> LedgerResult<SavingGoal> {
        let (name, target) = validation::goal(
            name,
            target_amount,
            self.config.max_name_length,
            self.config.max_amount,
        )?;

        let tx = begin(&mut self.conn)?;
        if let Some(account_id) = linked_account_id {
            load_account(&tx, user_id, account_id)?;
        }
        tx.execute(
            "INSERT INTO saving_goals(user_id, name, target_amount, linked_account_id, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, name, target, linked_account_id, deadline],
        )?;
        let goal = load_goal(&tx, user_id, tx.last_insert_rowid())?;
        tx.commit()?;

        info!(user_id, goal_id = goal.id, target = %target_amount, "created saving goal");
        Ok(goal)
    }

    /// Contributes from `source_account_id`, or from the goal's linked
    /// account when none is given.
    pub fn contribute(
        &mut self,
        user_id: i64,
        goal_id: i64,
        source_account_id: Option<i64>,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<ContributionOutcome> {
        let goal = load_goal(&self.conn, user_id, goal_id)?;
        let source = source_account_id
            .or(goal.linked_account_id)
            .ok_or(ValidationError::SourceAccountRequired)?;
        let posting = self.record_goal_contribution(user_id, goal_id, source, amount, timestamp)?;
        let completed = posting
            .goal
            .as_ref()
            .is_some_and(|g| g.status == GoalStatus::Completed);
        Ok(ContributionOutcome { posting, completed })
    }

    /// Closes a Completed goal into a new account opened with the goal's
    /// funds. The opening balance is logged as one income tagged with the goal.
    pub fn convert_to_account(
        &mut self,
        user_id: i64,
        goal_id: i64,
        account_type: AccountType,
        account_name: Option<&str>,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<Conversion> {
        let tx = begin(&mut self.conn)?;
        let goal = load_goal(&tx, user_id, goal_id)?;
        match goal.status {
            GoalStatus::Completed => {}
            GoalStatus::Active => {
                return Err(reject(RuleViolation::GoalNotCompleted { goal_id: goal.id }));
            }
            GoalStatus::Converted => {
                return Err(reject(RuleViolation::GoalNotActive {
                    goal_id: goal.id,
                    status: goal.status,
                }));
            }
        }

        let name = validation::name(
            "account name",
            account_name.unwrap_or(&goal.name),
            self.config.max_name_length,
        )?;
        ensure_account_slot(&tx, &self.config, user_id, name)?;
        let account_id = insert_account(&tx, user_id, name, account_type)?;

        let funds = crate::utils::to_minor(goal.current_amount).ok_or_else(|| {
            LedgerError::Integrity(format!("goal {} amount out of range", goal.id))
        })?;
        adjust_balance(&tx, account_id, funds)?;
        let description = format!("Converted from saving goal '{}'", goal.name);
        let transaction = append(
            &tx,
            &NewEntry {
                user_id,
                account_id,
                counter_account_id: None,
                category_id: None,
                goal_id: Some(goal.id),
                kind: TransactionType::Income,
                amount: funds,
                description: &description,
                timestamp,
            },
        )?;
        tx.execute(
            "UPDATE saving_goals SET status = 'Converted' WHERE id = ?1 AND status = 'Completed'",
            params![goal.id],
        )?;
        let account = load_account(&tx, user_id, account_id)?;
        let goal = load_goal(&tx, user_id, goal.id)?;
        tx.commit()?;

        info!(user_id, goal_id, account_id, amount = %goal.current_amount, "converted saving goal");
        Ok(Conversion {
            account,
            goal,
            transaction,
        })
    }

    pub fn delete_goal(
        &mut self,
        user_id: i64,
        goal_id: i64,
        deletion: GoalDeletion,
    ) -> LedgerResult<()> {
        let tx = begin(&mut self.conn)?;
        let goal = load_goal(&tx, user_id, goal_id)?;
        let holds_funds = goal.status != GoalStatus::Converted && goal.current_amount > Decimal::ZERO;
        if holds_funds && deletion == GoalDeletion::RequireEmpty {
            return Err(reject(RuleViolation::GoalHasFunds {
                goal_id: goal.id,
                amount: goal.current_amount,
            }));
        }
        tx.execute(
            "DELETE FROM saving_goals WHERE id = ?1 AND user_id = ?2",
            params![goal.id, user_id],
        )?;
        tx.commit()?;

        if holds_funds {
            tracing::warn!(user_id, goal_id, forfeited = %goal.current_amount, "deleted saving goal with funds");
        } else {
            info!(user_id, goal_id, "deleted saving goal");
        }
        Ok(())
    }

    pub fn goal(&self, user_id: i64, goal_id: i64) -> LedgerResult<SavingGoal> {
        load_goal(&self.conn, user_id, goal_id)
    }

    /// All goals of a user, open ones first.
    pub fn goals(&self, user_id: i64) -> LedgerResult<Vec<SavingGoal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM saving_goals WHERE user_id = ?1
             ORDER BY CASE status WHEN 'Active' THEN 0 WHEN 'Completed' THEN 1 ELSE 2 END, id",
            SavingGoal::COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], SavingGoal::from_row)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }

    pub fn goal_progress(
        &self,
        user_id: i64,
        goal_id: i64,
        today: NaiveDate,
    ) -> LedgerResult<GoalProgress> {
        Ok(progress_of(&self.goal(user_id, goal_id)?, today))
    }
}

pub fn progress_of(goal: &SavingGoal, today: NaiveDate) -> GoalProgress {
    let remaining = (goal.target_amount - goal.current_amount).max(Decimal::ZERO);
    let fraction = if goal.target_amount > Decimal::ZERO {
        (goal.current_amount / goal.target_amount)
            .min(Decimal::ONE)
            .round_dp(4)
    } else {
        Decimal::ZERO
    };
    GoalProgress {
        goal_id: goal.id,
        name: goal.name.clone(),
        current: goal.current_amount,
        target: goal.target_amount,
        remaining,
        fraction,
        status: goal.status,
        days_remaining: goal
            .deadline
            .map(|d| (d - today).num_days().max(0)),
    }
}

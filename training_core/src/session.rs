//! A player session that persists after every accepted command.
//!
//! Each command runs against the in-memory state. Refused commands leave
//! the state untouched and skip the save; accepted ones are handed to the
//! [`StateSink`] exactly once.

use crate::business::{self, Claim, UpgradePurchase};
use crate::plan::{self, PlanItemDraft};
use crate::schedule::{self, Completion};
use crate::{
    streak, Catalog, OwnedBusiness, Outcome, PlayerState, Result, StateSink, TrainingPlanItem,
};
use chrono::{DateTime, Utc};

pub struct GameSession<'a, S: StateSink> {
    state: PlayerState,
    catalog: &'a Catalog,
    sink: S,
}

impl<'a, S: StateSink> GameSession<'a, S> {
    pub fn new(state: PlayerState, catalog: &'a Catalog, sink: S) -> Self {
        Self {
            state,
            catalog,
            sink,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_state(self) -> PlayerState {
        self.state
    }

    fn commit<T>(&mut self, outcome: Outcome<T>) -> Result<Outcome<T>> {
        if outcome.is_ok() {
            self.sink.save(&self.state)?;
        }
        Ok(outcome)
    }

    /// Replace the whole state, e.g. from a restored backup
    pub fn replace_state(&mut self, state: PlayerState) -> Result<()> {
        self.state = state;
        self.sink.save(&self.state)
    }

    /// Roll the day forward; saves only when the day changed
    pub fn roll_day(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let changed = streak::roll_day(&mut self.state, now);
        if changed {
            self.sink.save(&self.state)?;
        }
        Ok(changed)
    }

    pub fn complete_activity(
        &mut self,
        plan_item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome<Completion>> {
        let outcome = schedule::complete_activity(&mut self.state, self.catalog, plan_item_id, now);
        self.commit(outcome)
    }

    pub fn confirm_plan_item(
        &mut self,
        editing: Option<&str>,
        draft: PlanItemDraft,
        now: DateTime<Utc>,
    ) -> Result<Outcome<String>> {
        let outcome = plan::confirm_plan_item(&mut self.state, self.catalog, editing, draft, now);
        self.commit(outcome)
    }

    pub fn remove_plan_item(
        &mut self,
        plan_item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome<TrainingPlanItem>> {
        let outcome = plan::remove_plan_item(&mut self.state, plan_item_id, now);
        self.commit(outcome)
    }

    pub fn purchase_business(
        &mut self,
        def_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome<OwnedBusiness>> {
        let outcome = business::purchase_business(&mut self.state, self.catalog, def_id, now);
        self.commit(outcome)
    }

    pub fn claim_interest(
        &mut self,
        instance_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome<Claim>> {
        let outcome = business::claim_interest(&mut self.state, self.catalog, instance_id, now);
        self.commit(outcome)
    }

    /// Buy an upgrade level, gated on the player's current level
    pub fn purchase_upgrade(
        &mut self,
        instance_id: &str,
        upgrade_id: &str,
    ) -> Result<Outcome<UpgradePurchase>> {
        let level = self.state.level();
        let outcome = business::purchase_upgrade(
            &mut self.state,
            self.catalog,
            instance_id,
            upgrade_id,
            level,
        );
        self.commit(outcome)
    }

    pub fn due_today(&self, now: DateTime<Utc>) -> Vec<&TrainingPlanItem> {
        schedule::get_due_today(&self.state, self.catalog, now)
    }

    pub fn pending_today(&self, now: DateTime<Utc>) -> Vec<&TrainingPlanItem> {
        schedule::pending_today(&self.state, self.catalog, now)
    }

    pub fn available_cycles(&self, instance_id: &str, now: DateTime<Utc>) -> Option<u32> {
        let instance = self.state.business(instance_id)?;
        let def = self.catalog.business(&instance.def_id)?;
        Some(business::get_available_cycles(instance, def, now))
    }
}

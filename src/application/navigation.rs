use crate::application::period_calculus::PeriodCalculus;
use crate::domain::period::{PeriodError, PeriodKey, PeriodOffsets, PeriodScope, Timeline};
use serde::{Deserialize, Serialize};

/// What the host shows for the active scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodView {
    pub scope: PeriodScope,
    pub offset: i64,
    pub period_key: PeriodKey,
    pub label: String,
    pub timeline: Timeline,
    pub banner: Option<String>,
}

/// Active scope plus one offset per scope.
///
/// Day and week offsets are kept in step: moving days re-derives the week
/// holding the new day, moving weeks snaps the day to that week's Monday.
/// Quarter and year offsets move independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavigationState {
    pub active_scope: PeriodScope,
    pub offsets: PeriodOffsets,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            active_scope: PeriodScope::Day,
            offsets: PeriodOffsets::default(),
        }
    }
}

impl NavigationState {
    pub fn set_offset(
        &mut self,
        calculus: &PeriodCalculus,
        scope: PeriodScope,
        offset: i64,
    ) -> Result<(), PeriodError> {
        // Validate before mutating so a failed move leaves the state intact.
        let key = calculus.key_from_offset(offset, scope)?;
        let mut offsets = self.offsets;
        offsets.set(scope, offset);
        match key.scope() {
            PeriodScope::Day => offsets.week = calculus.week_offset_for_day_offset(offset)?,
            PeriodScope::Week => offsets.day = calculus.day_offset_for_week_offset(offset)?,
            PeriodScope::Quarter | PeriodScope::Year => {}
        }
        self.offsets = offsets;
        Ok(())
    }

    /// Moves the active scope by `delta` periods.
    pub fn step(&mut self, calculus: &PeriodCalculus, delta: i64) -> Result<(), PeriodError> {
        let scope = self.active_scope;
        let offset = self
            .offsets
            .get(scope)
            .checked_add(delta)
            .ok_or_else(|| PeriodError::OutOfRange(format!("{scope} offset overflow")))?;
        self.set_offset(calculus, scope, offset)
    }

    /// Activates `scope`, re-deriving the dependent offset for day or week.
    pub fn switch_scope(&mut self, calculus: &PeriodCalculus, scope: PeriodScope) -> Result<(), PeriodError> {
        let offset = self.offsets.get(scope);
        self.set_offset(calculus, scope, offset)?;
        self.active_scope = scope;
        Ok(())
    }

    pub fn back_to_today(&mut self) {
        self.offsets = PeriodOffsets::default();
    }

    pub fn active_key(&self, calculus: &PeriodCalculus) -> Result<PeriodKey, PeriodError> {
        self.key_for(calculus, self.active_scope)
    }

    pub fn key_for(&self, calculus: &PeriodCalculus, scope: PeriodScope) -> Result<PeriodKey, PeriodError> {
        calculus.key_from_offset(self.offsets.get(scope), scope)
    }

    pub fn view(&self, calculus: &PeriodCalculus) -> Result<PeriodView, PeriodError> {
        let period_key = self.active_key(calculus)?;
        let label = calculus.format_label(&period_key);
        let timeline = calculus.classify(&period_key);
        Ok(PeriodView {
            scope: self.active_scope,
            offset: self.offsets.get(self.active_scope),
            banner: banner_text(timeline, &label),
            period_key,
            label,
            timeline,
        })
    }
}

/// Banner shown when the user is looking away from the current period.
pub fn banner_text(timeline: Timeline, label: &str) -> Option<String> {
    match timeline {
        Timeline::Past => Some(format!("📋 Viewing past — {label}")),
        Timeline::Future => Some(format!("✨ Planning ahead — {label}")),
        Timeline::Current => None,
    }
}

//! Per-session working set, scoped by run token.

use chrono::{DateTime, Utc};

use super::types::{AggregateRun, RunToken};
use crate::model::{Query, Title};

/// The result set a caller is currently looking at.
///
/// Two tokens are tracked. `current` is the latest run started with
/// [`SearchSession::begin`]; only it may commit. `committed` is the run that
/// produced the visible titles; only it may write enriched titles back.
/// While a new run is in flight the old working set stays visible, but a
/// title read from it can never land in the set that replaces it.
#[derive(Debug, Clone)]
pub struct SearchSession {
    current: Option<RunToken>,
    committed: Option<RunToken>,
    query: Option<Query>,
    titles: Vec<Title>,
    updated_at: DateTime<Utc>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            current: None,
            committed: None,
            query: None,
            titles: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Start a new run; results of any earlier run will be ignored.
    pub fn begin(&mut self) -> RunToken {
        let token = RunToken::new();
        self.current = Some(token);
        self.updated_at = Utc::now();
        token
    }

    pub fn current_run(&self) -> Option<RunToken> {
        self.current
    }

    pub fn is_current(&self, run: &RunToken) -> bool {
        self.current.as_ref() == Some(run)
    }

    /// Run that owns the visible titles.
    pub fn committed_run(&self) -> Option<RunToken> {
        self.committed
    }

    /// Replace the working set with a finished run's titles.
    ///
    /// Returns false, changing nothing, if the run is no longer current.
    pub fn commit(&mut self, run: &AggregateRun) -> bool {
        if !self.is_current(&run.run) {
            return false;
        }
        self.committed = Some(run.run);
        self.query = Some(run.query.clone());
        self.titles = run.outcome.titles().to_vec();
        self.updated_at = Utc::now();
        true
    }

    /// Write back a title enriched after the run, matched by identity key.
    ///
    /// `run` must be the run whose titles are visible, as read from
    /// [`SearchSession::committed_run`] together with the title. Returns
    /// false if another run has committed since or the title is not in the set.
    pub fn update_title(&mut self, run: &RunToken, title: Title) -> bool {
        if self.committed.as_ref() != Some(run) {
            return false;
        }
        let key = title.key();
        match self.titles.iter_mut().find(|t| t.key() == key) {
            Some(slot) => {
                *slot = title;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    pub fn title(&self, index: usize) -> Option<&Title> {
        self.titles.get(index)
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

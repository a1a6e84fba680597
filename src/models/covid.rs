// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! County case-count time series.

use serde::Serialize;

/// Cumulative confirmed cases for one county/state combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountySeries {
    /// County name (`Admin2` in the source; may be empty)
    pub county: String,
    /// State or territory (`Province_State` in the source)
    pub state: String,
    /// Display key, e.g. "Autauga, Alabama, US"
    pub combined_key: String,
    /// One cumulative count per date column; `None` where the cell was blank.
    pub cumulative: Vec<Option<i64>>,
}

impl CountySeries {
    /// Day-over-day differences of the cumulative counts.
    ///
    /// The first day has no predecessor and is `None`, as is any day whose
    /// own value or predecessor is missing. Source corrections can make a
    /// delta negative; those pass through unchanged.
    pub fn daily_new_cases(&self) -> Vec<Option<i64>> {
        let mut deltas = Vec::with_capacity(self.cumulative.len());
        let mut previous: Option<Option<i64>> = None;

        for &value in &self.cumulative {
            let delta = match (previous, value) {
                (Some(Some(prev)), Some(cur)) => Some(cur - prev),
                _ => None,
            };
            deltas.push(delta);
            previous = Some(value);
        }

        deltas
    }
}

/// The whole county table: shared date axis plus one series per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseTable {
    /// Date column headers in source order (e.g. "1/22/20")
    pub dates: Vec<String>,
    pub rows: Vec<CountySeries>,
}

impl CaseTable {
    /// Every combined location key, in row order.
    pub fn locations(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.combined_key.as_str()).collect()
    }

    /// Distinct states in order of first appearance.
    pub fn states(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .map(|r| r.state.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Rows matching an exact county and state. Matches nothing silently.
    pub fn select(&self, county: &str, state: &str) -> Vec<&CountySeries> {
        self.rows
            .iter()
            .filter(|r| r.county == county && r.state == state)
            .collect()
    }
}

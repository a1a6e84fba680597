// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod covid;
pub mod record;

pub use activity::{
    ColumnSpec, Conversion, EdmType, ACTIVITY_COLUMNS, ACTIVITIES_TABLE, INGESTED_ACTIVITIES_TABLE,
    KEY_COLUMN,
};
pub use covid::{CaseTable, CountySeries};
pub use record::{scalar_text, Record};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - fetchers, transforms and batch jobs.

pub mod covid;
pub mod garmin;
pub mod ingest;
pub mod jobs;
pub mod oauth1;
pub mod transform;

pub use garmin::{GarminClient, GarminError};
pub use transform::{transform_activities, TransformError};

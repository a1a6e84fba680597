// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (MySQL, optionally reached over an SSH tunnel).

pub mod connection;
pub mod tables;
pub mod tunnel;

pub use connection::ConnectionProvider;
pub use tables::TableStore;

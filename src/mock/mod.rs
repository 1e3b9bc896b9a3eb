// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Stateful mock store and prebuilt CRUD simulation

mod rest;
mod store;

pub use rest::{rest_resource, RestResource};
pub use store::MockStore;

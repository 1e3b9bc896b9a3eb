// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Route matching, registration, and per-request contexts

mod context;
mod handler;
mod pattern;
mod registry;

pub use context::{AbortReason, RouteContext};
pub use handler::RouteHandler;
pub use pattern::{GlobPattern, RoutePattern, UrlPredicate};
pub use registry::{HandlerRegistry, HandlerScope, Registration, RouteHandle};

pub(crate) use context::Resolution;

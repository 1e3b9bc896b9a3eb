// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request/response shapes and the real-network backend

mod backend;
mod builder;
mod request;
mod response;

pub use backend::{
    HttpBackend, HttpBackendConfig, NetworkBackend, NoNetworkBackend, DEFAULT_USER_AGENT,
};
pub use builder::ResponseBuilder;
pub use request::{Request, RequestOverrides, ResourceType};
pub use response::Response;

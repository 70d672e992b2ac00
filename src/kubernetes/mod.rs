// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes credential bootstrap, typed clients, and the resource facade.

pub mod clients;
pub mod credentials;
pub mod resources;

pub use clients::ClientSet;
pub use credentials::load_credentials;
pub use resources::ResourceManager;

//! Helm release lifecycle management for the fleet deployment agent.
//!
//! This crate installs, upgrades, uninstalls and inspects Helm chart releases
//! on a Kubernetes cluster on behalf of a deployment agent. Charts are
//! resolved from OCI registries or classic HTTP chart repositories, and every
//! mutating operation runs with wait-for-ready semantics, a fixed timeout and
//! atomic rollback-on-failure.

/// Contains the registry authentication boundary consulted when a namespace
/// connection is first created.
pub mod auth;

/// Contains the crate error type, constants, validators and Kubernetes client
/// helpers.
pub mod common;

/// Contains the namespace connection cache, chart resolution and the helm
/// command backend.
pub mod helm;

/// Contains decoding of rendered release manifests into resource objects.
pub mod manifest;

/// Contains the release lifecycle operations.
pub mod release;

pub use common::error::{Error, Result};
pub use release::{HelmDeployment, ReleaseLifecycle, ReleaseRecord};

/// Contains constants fixed across the crate.
pub(crate) mod constants;

/// Contains the error handling tooling.
pub mod error;

/// Contains helpers for generating Kubernetes API clients.
pub mod kube_client;

/// Contains macros.
pub(crate) mod macros;

/// Contains validation for namespaces and release names.
pub(crate) mod validators;

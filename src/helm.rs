/// Contains chart source resolution, the preflight step of install and upgrade.
pub mod chart;

/// Contains the ReleaseBackend trait and the helm command client implementing it.
pub mod client;

/// Contains the namespace-scoped connection handles and their cache.
pub mod connection;

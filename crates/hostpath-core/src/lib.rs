//! # hostpath-core
//!
//! Host directory provisioning for the hostpath provisioner.
//!
//! This crate provides:
//! - **Filesystem**: free-space probing via `statvfs(2)` and the volume
//!   directory lifecycle (create, chmod, recursive remove).
//! - **Provisioner**: the two-operation [`Provisioner`](provisioner::Provisioner)
//!   contract and its [`HostPathProvisioner`](provisioner::hostpath::HostPathProvisioner)
//!   implementation, which refuses to delete volumes it does not own.
//!
//! Nothing here watches, retries, or schedules. Callers own that loop and
//! branch on [`ErrorClass`](hostpath_common::error::ErrorClass).

pub mod filesystem;
pub mod provisioner;

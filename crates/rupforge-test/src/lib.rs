//! Shared test fixtures for RupForge crates.
//!
//! This crate provides synthetic fault networks and deterministic
//! collaborators. It does NOT depend on `rupforge-filters` to avoid
//! circular dependencies.
//!
//! - [`network`] - straight synthetic faults, clusters, jumps and ruptures
//! - [`geometry`] - planar distance/azimuth calculator
//! - [`stiffness`] - table-driven stiffness calculator
//! - [`connection`] - fixed connection strategy
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! rupforge-test = { workspace = true }
//! ```
//!
//! Then build a network and grow ruptures on it:
//!
//! ```
//! use rupforge_test::network::FaultNetwork;
//!
//! let mut net = FaultNetwork::new();
//! net.add_fault(1, 3, (0.0, 0.0), 0.0);
//! net.add_fault(2, 3, (0.0, 32.0), 0.0);
//!
//! let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);
//! assert_eq!(rupture.total_num_sects(), 6);
//! ```

pub mod connection;
pub mod geometry;
pub mod network;
pub mod stiffness;

pub use connection::FixedConnectionStrategy;
pub use geometry::PlanarDistAzCalc;
pub use network::FaultNetwork;
pub use stiffness::TableStiffnessCalc;

//! Sphere geometry for the Polarise simulation.
//!
//! The world is a single planet centred at the origin. This crate provides
//! the math every agent needs to stay on it: projection onto concentric
//! shells, tangent-plane bases, great-circle movement, random placement,
//! spawn-center relaxation, and a spatial hash for neighbour queries.
//!
//! # Modules
//!
//! - [`planet`] -- Shell projection, tangent bases, and surface movement.
//! - [`relax`] -- Forced-repulsion relaxation of spawn centers.
//! - [`spatial`] -- Uniform-grid spatial hash over agent indices.

pub mod planet;
pub mod relax;
pub mod spatial;

pub use planet::{
    TangentBasis, arc_distance, project_onto_tangent, project_to_shell, random_point_near,
    random_surface_point, rotate_along_surface, surface_normal,
};
pub use relax::{RelaxParams, RelaxReport, min_pairwise_distance, relax_points};
pub use spatial::SpatialHash;

//! Mesh processing algorithms.
//!
//! - **Curvature**: principal curvature estimation by quadric fitting or the
//!   Meyer et al. discrete operators
//! - **Flow**: explicit mean curvature flow
//! - **Progress**: callbacks for long-running operations

pub mod curvature;
pub mod flow;
pub mod progress;

pub use progress::Progress;

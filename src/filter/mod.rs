//! Host-registrable filters.
//!
//! A host application lists filters through a [`FilterRegistry`], shows each
//! [`FilterDescriptor`] and its parameters, and runs a filter in two phases:
//! [`Filter::prepare`] when the filter is opened and [`Filter::apply`] when
//! the user confirms.
//!
//! ```
//! use mcflow::filter::{FilterClass, FilterRegistry};
//!
//! let registry = FilterRegistry::with_builtin_filters();
//! for descriptor in registry.descriptors() {
//!     assert_eq!(descriptor.class, FilterClass::Smoothing);
//!     println!("{}: {}", descriptor.id, descriptor.name);
//! }
//! ```

mod mean_curvature;
mod params;
mod registry;

pub use mean_curvature::{MeanCurvatureFlowFilter, MEAN_CURVATURE_FLOW_ID, TIME_PARAMETER};
pub use params::{ParameterDecl, ParameterSet, ParameterValue};
pub use registry::{Filter, FilterClass, FilterDescriptor, FilterOutcome, FilterRegistry};

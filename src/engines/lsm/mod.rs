//! Least-squares Monte Carlo engines for early exercise.

pub mod longstaff_schwartz;

pub use longstaff_schwartz::{ExerciseBoundaryPoint, LongstaffSchwartzEngine, LsmOutput};

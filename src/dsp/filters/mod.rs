pub mod ssm2044;
pub mod vactrol;

pub use ssm2044::{Ssm2044, Ssm2044Inputs};
pub use vactrol::{Vactrol, VactrolInputs};

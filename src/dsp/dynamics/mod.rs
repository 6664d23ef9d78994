pub mod modvca;

pub use modvca::{ModVca, ModVcaInputs};

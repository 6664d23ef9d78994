pub mod decay;
pub mod slewenv;

pub use decay::{Decay, DecayInputs};
pub use slewenv::{SlewEnv, SlewEnvInputs};

pub mod cycle2d;
pub mod cyclefold;
pub mod easelfo;
pub mod harmosc;
pub mod ramplfo;

pub use cycle2d::{Cycle2d, Cycle2dInputs};
pub use cyclefold::{CycleFold, CycleFoldInputs};
pub use easelfo::{EaseLfo, EaseLfoInputs};
pub use harmosc::{HarmOsc, HarmOscInputs};
pub use ramplfo::{RampLfo, RampLfoInputs};

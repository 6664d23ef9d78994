pub mod consts;
pub mod dynamics;
pub mod envelopes;
pub mod filters;
pub mod noise;
pub mod oscillators;
pub mod utils;

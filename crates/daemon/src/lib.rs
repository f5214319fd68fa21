pub mod protocol;
pub mod synth;

pub mod bin_state;
pub mod canvas;
pub mod choreography;
pub mod renderer;
pub mod sequencer;
pub mod status;
pub mod utils;

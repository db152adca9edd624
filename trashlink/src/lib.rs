// THEORY:
// This file is the main entry point for the `trashlink` library crate: a simulated
// smart waste bin with a biomedical and a general compartment.
//
// The public face is the `dashboard` module (`BinDashboard`, `ControlEvent`,
// `FrameSink`), which is what a user interface drives. Underneath it the
// `core_modules` hold the two real components:
//   - `renderer`:  a pure function from (levels, lid angle, falling item) to a frame.
//   - `sequencer`: the owner of the fill levels, producing one lazy frame sequence
//                  per dropped item and committing the new level at its end.
// Everything else (`choreography`, `canvas`, `status`, `bin_state`) supports those two.

pub mod core_modules;
pub mod dashboard;
pub mod error;

pub use core_modules::bin_state::{BinState, FallingItem, LidState, WasteKind};
pub use core_modules::renderer::Frame;
pub use core_modules::sequencer::{AnimationSequencer, DropSequence};
pub use core_modules::status::StatusReport;
pub use core_modules::utils::image_helper::image_helper::{FrameFormat, encode, save_png};
pub use dashboard::{BinDashboard, ControlEvent, FrameSink};
pub use error::{BinError, Result};

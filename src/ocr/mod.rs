//! Character recognition of digit cells.
//!
//! The engine is a capability behind `CharacterRecognizer`; the only policy
//! on top of it is `select_best`, which picks one candidate per cell.

pub mod engine;
pub mod select;
pub mod setup;

pub use engine::{CharacterRecognizer, TesseractEngine};
pub use select::recognize_digit;
pub use setup::ensure_tesseract;

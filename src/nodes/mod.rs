//! Composite operators built on the signal node abstraction.

mod fader;
mod mix;
mod sig;

pub use fader::InputFader;
pub use mix::Mix;
pub use sig::{Sig, SigTo};

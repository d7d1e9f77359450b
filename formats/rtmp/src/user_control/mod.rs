pub mod consts;
mod writer;

pub use writer::{write, UserControlEvent};

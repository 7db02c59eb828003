pub mod config;
pub mod errors;
pub mod packer;
pub mod search;

pub use packer::{PackedPrompt, pack, pack_with};

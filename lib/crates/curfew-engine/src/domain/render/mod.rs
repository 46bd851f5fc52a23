//! Pure renderers, one per enforcement grammar.
//!
//! Everything here is string in, string out. Paths only appear as values
//! embedded in the output; nothing touches the filesystem.

pub mod hosts;
pub mod nftables;
pub mod pac;
pub mod squid;

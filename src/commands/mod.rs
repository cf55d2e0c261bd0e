// ABOUTME: Command module aggregator for the regkeep CLI.
// ABOUTME: Re-exports push, digest and delete command handlers.

mod delete;
mod digest;
mod push;

pub use delete::delete;
pub use digest::digest;
pub use push::push;

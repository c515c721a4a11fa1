pub mod extract;
pub mod protected;
pub mod public;

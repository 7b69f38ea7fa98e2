pub mod inspect;
pub mod sign;

pub use inspect::InspectCommand;
pub use sign::SignCommand;

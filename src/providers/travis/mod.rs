mod client;
mod harvest;
mod types;

pub use harvest::TravisProvider;

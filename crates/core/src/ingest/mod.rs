pub mod companies;
pub mod outcome;
pub mod provider;
pub mod types;

pub mod company;
pub mod record;
pub mod rows;

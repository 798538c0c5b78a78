pub mod ancestry;
pub mod tree;

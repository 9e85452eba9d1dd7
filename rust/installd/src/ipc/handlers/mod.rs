pub mod core;
pub mod installments;
pub mod reference;
pub mod table;

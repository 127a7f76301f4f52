//! Reading the parameter table and resolving links.

pub mod links;
pub mod validation;

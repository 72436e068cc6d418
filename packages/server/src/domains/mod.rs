// Domain modules

pub mod registration;

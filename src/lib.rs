#[macro_use]
extern crate lazy_static;

pub mod blind;
pub mod common;
pub mod error;
pub mod group_config;
pub mod hash;
pub mod keys;
pub mod multisig;
pub mod net;
pub mod schnorr;

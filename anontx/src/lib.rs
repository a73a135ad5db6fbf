#![doc = include_str!("../README.md")]
#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    missing_docs,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod protocol;
pub mod session;

#[cfg(any(test, feature = "dev"))]
pub mod dev;

#[cfg(test)]
mod tests;

//! Typed repositories.
//!
//! A [`Repository<T>`] stores entities implementing [`DocumentCodec`] in
//! their collection and runs filter searches against the entity's field
//! allow-list.

mod codec;
mod typed;

pub use codec::DocumentCodec;
pub use typed::Repository;

pub mod grid;
pub mod inspect;

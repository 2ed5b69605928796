pub mod hash;
pub mod prg;
pub mod random;

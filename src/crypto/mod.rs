pub mod cipher;
pub mod lookup;
pub mod reveal;

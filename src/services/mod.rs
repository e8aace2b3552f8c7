pub mod canvas;
pub mod chat;
pub mod lobby;
pub mod packs;
pub mod reveal;
pub mod round;
pub mod session;

//! Repository methods on `HistoryService`.
//!
//! `entity` performs recorded writes, `history` reads entries back.

pub mod entity;
pub mod history;

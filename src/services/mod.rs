pub mod context;
pub mod history;
pub mod player;
pub mod resolver;
pub mod router;
pub mod storage;

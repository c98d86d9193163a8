pub mod media;
pub mod queue;
pub mod redis;
pub mod storage;

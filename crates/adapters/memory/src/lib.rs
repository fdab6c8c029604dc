//! creator-adapter-memory - 进程内缓存适配器

mod cache;

pub use cache::*;

mod od_cache;

pub use od_cache::OdCache;

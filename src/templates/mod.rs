pub(crate) mod storage;
pub(crate) mod store;

pub(crate) mod cache;
pub(crate) mod datauri;
pub(crate) mod decode;
pub(crate) mod queue;

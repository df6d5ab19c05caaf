pub(crate) mod action;
pub(crate) mod controller;
pub(crate) mod events;
pub(crate) mod preview;

pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod cpu;
pub(crate) mod date;
pub(crate) mod frame;
pub(crate) mod text;

pub(super) mod layer;
pub(super) mod service;

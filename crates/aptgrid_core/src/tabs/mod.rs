//! Tab switching and lazy projection materialization.

pub mod session;

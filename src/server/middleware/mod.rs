//! warp filters wrapped around every route

pub mod logging;

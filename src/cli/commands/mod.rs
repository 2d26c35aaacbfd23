pub mod apply;
pub mod context;
pub mod init;
pub mod scan;
pub mod suggest;

mod command_result;

pub use command_result::*;

pub mod agent;
pub mod apply;
pub mod dispatch;
pub mod import;
pub mod init;
pub mod plan;
pub mod rebuild;
pub mod recommend;
pub mod restore;
pub mod revoke;
pub mod rotate;
pub mod scan;
pub mod setup_git;
pub mod shared;
pub mod status;
pub mod token;
pub mod validate;

pub mod build_index;
pub mod export;
pub mod fields;
pub mod history;
pub mod init;
pub mod link;
pub mod lookup;
pub mod search;
pub mod show;
pub mod synthesize;

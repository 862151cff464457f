pub mod domain;
pub mod error;
pub mod protocol;
pub mod report;
pub mod view;

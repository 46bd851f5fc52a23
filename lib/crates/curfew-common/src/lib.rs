pub mod api;
pub mod config;
pub mod types;

pub use api::{
    AddAppRequest, ErrorBody, GroupResponse, PolicyResponse, ReplacePolicyRequest,
    StatusResponse, TicketResponse, WaitStatus,
};
pub use config::PolicyServerConfig;
pub use types::*;

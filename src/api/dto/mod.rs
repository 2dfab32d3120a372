//! Data Transfer Objects for REST request/response serialization.

pub mod connection_dto;

pub use crate::domain::put_events::{
    PutEventsEntry, PutEventsRequest, PutEventsResponse, PutEventsResultEntry,
};
pub use connection_dto::*;

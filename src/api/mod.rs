//! Public entry points for the transport layer.
//!
//! Routing and JSON transport live outside this crate; these handlers take
//! deserialised parameters and return serialisable payloads.

pub mod query;

pub use query::{
    handle_disparity, handle_export, handle_feature_list, handle_gap, handle_graph,
    handle_heatmap, handle_rescore, ErrorBody,
};

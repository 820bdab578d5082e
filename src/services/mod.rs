//! Contracts with the search, extract, crawl, map and flow-generation services.

pub mod client;
pub mod types;

pub use client::{FlowGenerator, HttpServiceClient, WebIntelligence};
pub use types::{
    is_meaningful, CrawlRequest, ExtractDepth, ExtractRequest, GenerateFlowRequest, MapRequest,
    ResultItem, SearchRequest, ServiceResponse, TextResponse, UrlListResponse, NO_ANSWER_SENTINEL,
};

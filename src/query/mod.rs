//! Query text, page arithmetic and request payloads. Pure; no I/O.

pub mod clean;
pub mod plan;
pub mod request;

pub use clean::{Query, SERVICE_DATA_PREFIX, clean_pass, clean_query};
pub use plan::{PagePlan, page_span, pages_for};
pub use request::{PageRequest, SessionDevice, SessionMeta, build_page_request};

//! Local state: the MCP server registry and the scraping job slot

mod server_registry;
mod scraping;

pub use server_registry::{ProvisionTiming, ServerRegistry};
pub use scraping::ScrapingJobSlot;

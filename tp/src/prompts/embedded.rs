//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System message for the itinerary request
pub const ITINERARY_SYSTEM: &str = include_str!("../../prompts/itinerary-system.pmt");

/// Human message for the itinerary request
pub const ITINERARY_HUMAN: &str = include_str!("../../prompts/itinerary-human.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "itinerary-system" => Some(ITINERARY_SYSTEM),
        "itinerary-human" => Some(ITINERARY_HUMAN),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

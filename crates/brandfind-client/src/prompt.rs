//! Prompt text for the website lookup.

use crate::types::ChatMessage;

const SYSTEM_PROMPT: &str = "You are a research assistant with web search access. \
You find the official websites of brands and answer only with a single JSON object.";

/// Build the system and user messages for looking up `brand`.
#[must_use]
pub fn build_messages(brand: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_prompt(brand)),
    ]
}

/// The user prompt asking for `brand`'s official website in a fixed JSON
/// shape.
#[must_use]
pub fn build_prompt(brand: &str) -> String {
    format!(
        r#"Search the web for the official website of the brand "{brand}".

Requirements:
- Return the brand's own official website, not a reseller, marketplace listing, retailer, distributor, review site, social media profile, or fan site.
- Check that the website is actually about this brand and matches what the brand makes or sells. If several companies share the name, pick the most prominent one and say so in "notes".
- If you cannot find an official website, set "website_url" to null and explain why in "notes".

Respond with exactly one JSON object and nothing else, in this shape:
{{
  "brand_name": "{brand}",
  "website_url": "https://... or null",
  "description": "one or two sentences about the brand",
  "additional_info": {{
    "founded": "year or null",
    "location": "headquarters location or null",
    "specialties": "main products or focus, or null"
  }},
  "search_confidence": "high | medium | low",
  "notes": "how the website was verified, or null"
}}"#
    )
}

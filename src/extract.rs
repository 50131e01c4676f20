use crate::browser::PageElement;
use crate::error::ExtractionError;
use crate::results::ImageLink;
use serde_json::Value;

/// Attribute carrying the result item's JSON payload
pub const DATA_ATTRIBUTE: &str = "data-bem";

/// Path to the image URL inside the payload
const ITEM_KEY: &str = "serp-item";
const HREF_KEY: &str = "img_href";

/// Extracts the image link embedded in a result element
pub async fn extract<E: PageElement>(element: &E) -> Result<ImageLink, ExtractionError> {
    match element.attribute(DATA_ATTRIBUTE).await? {
        Some(payload) => parse_link(&payload),
        None => Err(ExtractionError::MissingAttribute(DATA_ATTRIBUTE.to_string())),
    }
}

/// Reads `serp-item.img_href` out of a `data-bem` payload
pub fn parse_link(payload: &str) -> Result<ImageLink, ExtractionError> {
    let data: Value =
        serde_json::from_str(payload).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    data.get(ITEM_KEY)
        .and_then(|item| item.get(HREF_KEY))
        .and_then(Value::as_str)
        .map(ImageLink::new)
        .ok_or_else(|| ExtractionError::MissingKey(format!("{ITEM_KEY}.{HREF_KEY}")))
}

/// Extracts links from every element in order, skipping the ones that fail.
///
/// Returns the links and the number of skipped elements.
pub async fn extract_all<E: PageElement>(elements: &[E]) -> (Vec<ImageLink>, usize) {
    let mut links = Vec::with_capacity(elements.len());
    let mut skipped = 0;

    for (position, element) in elements.iter().enumerate() {
        match extract(element).await {
            Ok(link) => links.push(link),
            Err(e) => {
                ::log::debug!("Skipping element {}: {}", position, e);
                skipped += 1;
            }
        }
    }

    (links, skipped)
}

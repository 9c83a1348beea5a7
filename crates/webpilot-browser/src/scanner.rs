//! Page-to-structure simplification: the injected scan script and its output model.

use serde::{Deserialize, Serialize};

use crate::BrowserError;

/// Attribute the scan script stamps onto each selected element so a later
/// click/fill can resolve the identifier with an exact CSS match.
pub const ID_ATTRIBUTE: &str = "data-pilot-id";

/// CSS class of the numeric overlay labels drawn during a scan.
pub const MARKER_CLASS: &str = "pilot-marker";

/// Injected into the page on every scan. Clears all markers and identifier
/// tags left by the previous scan, then walks the document in traversal
/// order selecting visible interactive elements, tagging each with a fresh
/// sequential id (starting at 1), outlining it, and overlaying its number.
/// Labels are trimmed to 50 chars with newlines collapsed to spaces.
pub const SCAN_SCRIPT: &str = r#"
    return (() => {
        document.querySelectorAll('.pilot-marker').forEach(e => e.remove());
        document.querySelectorAll('[data-pilot-id]').forEach(e => {
            e.removeAttribute('data-pilot-id');
            e.style.outline = '';
        });

        const items = [];
        let idCounter = 1;

        function isVisible(elem) {
            if (!elem) return false;
            const style = window.getComputedStyle(elem);
            if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
                return false;
            }
            const rect = elem.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        }

        const selectors = [
            'a[href]', 'button', 'input', 'textarea', 'select',
            '[role="button"]', '[role="link"]', '[role="checkbox"]', '[role="menuitem"]'
        ];

        document.querySelectorAll(selectors.join(',')).forEach(el => {
            if (!isVisible(el)) return;

            const id = idCounter++;
            el.setAttribute('data-pilot-id', id.toString());
            el.style.outline = '2px solid red';

            const marker = document.createElement('div');
            marker.className = 'pilot-marker';
            marker.innerText = id;
            marker.style.position = 'absolute';
            marker.style.background = 'yellow';
            marker.style.color = 'black';
            marker.style.border = '1px solid black';
            marker.style.zIndex = '9999';
            marker.style.padding = '2px';
            marker.style.fontSize = '12px';
            marker.style.fontWeight = 'bold';

            const rect = el.getBoundingClientRect();
            marker.style.top = (window.scrollY + rect.top) + 'px';
            marker.style.left = (window.scrollX + rect.left) + 'px';
            document.body.appendChild(marker);

            const text = (el.innerText || el.value || el.getAttribute('aria-label') || '')
                .slice(0, 50)
                .replace(/\n/g, ' ');
            items.push({
                id: id,
                tag: el.tagName.toLowerCase(),
                type: el.getAttribute('type') || '',
                text: text
            });
        });

        return items;
    })();
"#;

/// One page element eligible for interaction during the current cycle.
///
/// The identifier is only meaningful until the next scan runs; resolution
/// goes through the page-side tag, never through a cached handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveElement {
    pub id: u32,
    pub tag: String,
    #[serde(rename = "type", default)]
    pub input_type: String,
    #[serde(rename = "text", default)]
    pub label: String,
}

/// Exact-match selector for an identifier assigned by the most recent scan.
pub fn selector_for(element_id: u32) -> String {
    format!("[{}='{}']", ID_ATTRIBUTE, element_id)
}

/// Decode the scan script's return value.
pub fn parse_scan_result(value: serde_json::Value) -> Result<Vec<InteractiveElement>, BrowserError> {
    serde_json::from_value(value)
        .map_err(|e| BrowserError::Scan(format!("unexpected scan script output: {}", e)))
}

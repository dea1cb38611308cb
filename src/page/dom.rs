//! JS snippet builders for DOM queries and interactions.
//!
//! Every dynamic value is JSON-escaped before being spliced into a script so
//! labels containing quotes (or the umlauts and arrows the app uses) survive
//! the trip through `Runtime.evaluate`.

use crate::client::ClientError;

/// How a button label should be compared against `textContent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Trimmed text must equal the label ("Start" must not match
    /// "Simulation Starten").
    Exact,
    /// Trimmed text must contain the label.
    Contains,
}

impl MatchMode {
    fn as_js_bool(self) -> &'static str {
        match self {
            MatchMode::Exact => "true",
            MatchMode::Contains => "false",
        }
    }
}

/// Shared helpers embedded at the top of interaction scripts.
const JS_HELPERS: &str = "\
const isVisible = (el) => {
    if (!el) return false;
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
};
const labelMatches = (el, label, exact) => {
    const text = (el.textContent || '').trim();
    return exact ? text === label : text.includes(label);
};";

fn escape(value: &str) -> Result<String, ClientError> {
    Ok(serde_json::to_string(value)?)
}

/// True when the first element matching `selector` is visible.
pub fn is_visible_script(selector: &str) -> Result<String, ClientError> {
    let selector = escape(selector)?;
    Ok(format!(
        "(function() {{
            {JS_HELPERS}
            return isVisible(document.querySelector({selector}));
        }})()"
    ))
}

/// Count of visible buttons whose label matches.
pub fn button_count_script(label: &str, mode: MatchMode) -> Result<String, ClientError> {
    let label = escape(label)?;
    let exact = mode.as_js_bool();
    Ok(format!(
        "(function() {{
            {JS_HELPERS}
            const buttons = Array.from(document.querySelectorAll('button'));
            return buttons.filter(el => isVisible(el) && labelMatches(el, {label}, {exact})).length;
        }})()"
    ))
}

/// Click the first visible button whose label matches. Returns whether a
/// button was found and clicked.
pub fn click_button_script(label: &str, mode: MatchMode) -> Result<String, ClientError> {
    let label = escape(label)?;
    let exact = mode.as_js_bool();
    Ok(format!(
        "(function() {{
            {JS_HELPERS}
            const buttons = Array.from(document.querySelectorAll('button'));
            const target = buttons.find(el => isVisible(el) && labelMatches(el, {label}, {exact}));
            if (!target) {{
                return false;
            }}
            target.click();
            return true;
        }})()"
    ))
}

/// Trimmed labels of every button on the page, for diagnostics.
pub fn button_labels_script() -> String {
    "(function() {
        return Array.from(document.querySelectorAll('button'))
            .map(el => (el.textContent || '').trim());
    })()"
        .to_string()
}

/// Count of leaf elements whose trimmed text equals `text` exactly.
pub fn exact_text_count_script(text: &str) -> Result<String, ClientError> {
    let text = escape(text)?;
    Ok(format!(
        "(function() {{
            const wanted = {text};
            let count = 0;
            for (const el of document.querySelectorAll('body *')) {{
                if (el.children.length === 0 && (el.textContent || '').trim() === wanted) {{
                    count += 1;
                }}
            }}
            return count;
        }})()"
    ))
}

/// True once no visible leaf element contains `text` any more.
pub fn text_hidden_script(text: &str) -> Result<String, ClientError> {
    let text = escape(text)?;
    Ok(format!(
        "(function() {{
            {JS_HELPERS}
            const wanted = {text};
            for (const el of document.querySelectorAll('body *')) {{
                if (el.children.length === 0
                    && (el.textContent || '').trim().includes(wanted)
                    && isVisible(el)) {{
                    return false;
                }}
            }}
            return true;
        }})()"
    ))
}

/// Bounding box of the first element matching `selector`, or null.
pub fn bounding_box_script(selector: &str) -> Result<String, ClientError> {
    let selector = escape(selector)?;
    Ok(format!(
        "(function() {{
            const el = document.querySelector({selector});
            if (!el) {{
                return null;
            }}
            const rect = el.getBoundingClientRect();
            return {{ x: rect.x, y: rect.y, width: rect.width, height: rect.height }};
        }})()"
    ))
}

/// Find the `<select>` that offers an option labelled `option_label`, select
/// it, and fire the framework-visible events. Returns whether a match existed.
pub fn select_option_script(option_label: &str) -> Result<String, ClientError> {
    let label = escape(option_label)?;
    Ok(format!(
        "(function() {{
            const wanted = {label};
            const selects = Array.from(document.querySelectorAll('select'));
            const target = selects.find(sel =>
                Array.from(sel.options).some(opt => opt.text.trim() === wanted));
            if (!target) {{
                return false;
            }}
            const match = Array.from(target.options).find(opt => opt.text.trim() === wanted);
            target.value = match.value;
            target.dispatchEvent(new Event('input', {{ bubbles: true }}));
            target.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"
    ))
}

//! Embedded page templates
//!
//! Pages compile into the binary and render by placeholder replacement.
//! The dynamic parts are the filtered count, the chart captions, pending
//! flash notices, and the version footer.

const HOME_HTML: &str = include_str!("../ui/home.html");
const RESULTS_HTML: &str = include_str!("../ui/results.html");
const DATA_HTML: &str = include_str!("../ui/data.html");

/// Escape user-derived text for an HTML body or attribute
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The pending-notice block, or an empty string when there is nothing to
/// show
fn flash_block(flashes: &[String]) -> String {
    if flashes.is_empty() {
        return String::new();
    }
    let items: String = flashes
        .iter()
        .map(|message| format!("        <li>{}</li>\n", html_escape(message)))
        .collect();
    format!("    <ul class=\"flashes\">\n{items}    </ul>")
}

pub fn render_home(flashes: &[String]) -> String {
    HOME_HTML
        .replace("{{FLASHES}}", &flash_block(flashes))
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
}

pub fn render_results(filtered_num: u64, captions: &[String; 2], flashes: &[String]) -> String {
    RESULTS_HTML
        .replace("{{FLASHES}}", &flash_block(flashes))
        .replace("{{FILTERED_NUM}}", &filtered_num.to_string())
        .replace("{{PLOT1_CAPTION}}", &html_escape(&captions[0]))
        .replace("{{PLOT2_CAPTION}}", &html_escape(&captions[1]))
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
}

pub fn render_data(flashes: &[String]) -> String {
    DATA_HTML
        .replace("{{FLASHES}}", &flash_block(flashes))
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
}

//! Message texts for approval mail, notifications and to-dos.

/// Subject shared by the approval mail and the in-app notification.
pub fn approval_subject(doctype: &str, name: &str) -> String {
    format!("Approval Required: {doctype} {name}")
}

/// To-do description. Deterministic so re-runs leave it unchanged.
pub fn todo_description(action: &str, doctype: &str, name: &str, state: &str) -> String {
    format!("{action} required for {doctype} {name} (state: {state})")
}

/// Desk URL of a document, e.g. `https://erp.example.com/app/purchase-order/PO-0001`.
pub fn document_url(site_url: &str, doctype: &str, name: &str) -> String {
    let slug = doctype.trim().to_lowercase().replace(' ', "-");
    format!(
        "{}/app/{slug}/{}",
        site_url.trim_end_matches('/'),
        name.replace(' ', "%20")
    )
}

pub fn approval_email_body(doctype: &str, name: &str, state: &str, url: &str) -> String {
    let doctype = escape_html(doctype);
    let name = escape_html(name);
    let state = escape_html(state);
    let url = escape_html(url);
    format!(
        "<p>Hello,</p>\
         <p>{doctype} <b>{name}</b> is waiting for your approval in state <b>{state}</b>.</p>\
         <p><a href=\"{url}\">Open {doctype} {name}</a></p>"
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_slugs_the_doctype() {
        assert_eq!(
            document_url("https://erp.example.com/", "Purchase Order", "PO-0001"),
            "https://erp.example.com/app/purchase-order/PO-0001"
        );
    }

    #[test]
    fn body_escapes_markup() {
        let body = approval_email_body("Memo", "<script>", "Review", "http://x/app/memo/1");
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }
}

//! HTML bodies for transactional email. All visitor-supplied text is escaped.

use folio_core::{NewContactMessage, OutboundEmail};

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Notification sent to the site owner when the contact form is submitted.
pub fn contact_notification(owner_email: &str, contact: &NewContactMessage) -> OutboundEmail {
    let message = escape_html(&contact.message).replace('\n', "<br>");
    let html = format!(
        "<h2>New contact form submission</h2>\
         <p><strong>Name:</strong> {name}</p>\
         <p><strong>Email:</strong> {email}</p>\
         <p><strong>Subject:</strong> {subject}</p>\
         <hr><p>{message}</p>",
        name = escape_html(&contact.name),
        email = escape_html(&contact.email),
        subject = escape_html(&contact.subject),
    );
    OutboundEmail {
        to: owner_email.to_string(),
        subject: format!("Portfolio contact: {}", contact.subject),
        html,
        reply_to: Some(contact.email.clone()),
    }
}

/// Welcome email for a new newsletter subscriber.
pub fn newsletter_welcome(owner_name: &str, email: &str, name: Option<&str>) -> OutboundEmail {
    let greeting = match name {
        Some(n) => format!("Hi {},", escape_html(n)),
        None => "Hi there,".to_string(),
    };
    let html = format!(
        "<p>{greeting}</p>\
         <p>Thanks for subscribing to {owner}'s newsletter. You'll get new posts and \
         project updates straight to your inbox.</p>",
        owner = escape_html(owner_name),
    );
    OutboundEmail {
        to: email.to_string(),
        subject: format!("Welcome to {owner_name}'s newsletter"),
        html,
        reply_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn contact_notification_escapes_visitor_input() {
        let email = contact_notification(
            "owner@example.com",
            &NewContactMessage {
                name: "Eve".into(),
                email: "eve@example.com".into(),
                subject: "<b>hi</b> there".into(),
                message: "line one\n<img src=x>".into(),
            },
        );
        assert_eq!(email.to, "owner@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("eve@example.com"));
        assert!(!email.html.contains("<img"));
        assert!(email.html.contains("line one<br>&lt;img"));
    }

    #[test]
    fn welcome_uses_name_when_present() {
        let email = newsletter_welcome("Ada", "r@example.com", Some("Rae"));
        assert!(email.html.starts_with("<p>Hi Rae,</p>"));
        let anonymous = newsletter_welcome("Ada", "r@example.com", None);
        assert!(anonymous.html.starts_with("<p>Hi there,</p>"));
    }
}

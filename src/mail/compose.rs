//! Message builders for the two emails every submission produces.

use std::fmt::Write as _;

use crate::config::EmailConfig;
use crate::store::{NewSubmission, SubmissionKind};

use super::OutgoingEmail;

/// Escape the five HTML-significant characters.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn html_paragraphs(text: &str) -> String {
    html_escape(text).replace('\n', "<br>")
}

/// "Thanks, we got it" message sent back to the submitter.
pub fn acknowledgement(config: &EmailConfig, site: &str, sub: &NewSubmission) -> OutgoingEmail {
    let topic = match sub.kind {
        SubmissionKind::Contact => "your message",
        SubmissionKind::DiscussProject => "your project enquiry",
    };
    let subject = format!("Thanks for reaching out to {site}");

    let text = format!(
        "Hi {name},\n\nThanks for {topic}. It has been received and you will get a reply soon.\n\n\
         For reference, here is what you sent:\n\n{message}\n\n-- {site}\n",
        name = sub.name,
        message = sub.message,
    );
    let html = format!(
        "<p>Hi {name},</p><p>Thanks for {topic}. It has been received and you will get a reply soon.</p>\
         <p>For reference, here is what you sent:</p><blockquote>{message}</blockquote><p>-- {site}</p>",
        name = html_escape(&sub.name),
        message = html_paragraphs(&sub.message),
        site = html_escape(site),
    );

    OutgoingEmail {
        from: config.from.clone(),
        to: vec![sub.email.clone()],
        subject,
        text,
        html: Some(html),
        reply_to: None,
    }
}

/// Owner-facing notification. Replying goes straight to the submitter.
pub fn notification(config: &EmailConfig, sub: &NewSubmission) -> OutgoingEmail {
    let subject = match (sub.kind, sub.subject.as_deref()) {
        (SubmissionKind::Contact, Some(s)) => format!("[contact] {s}"),
        (SubmissionKind::Contact, None) => format!("[contact] Message from {}", sub.name),
        (SubmissionKind::DiscussProject, _) => {
            let project = sub.details.get("project_type").map(String::as_str).unwrap_or("project");
            format!("[discuss-project] {project} from {}", sub.name)
        }
    };

    let mut text = format!("From: {} <{}>\nKind: {}\n", sub.name, sub.email, sub.kind);
    let mut rows = format!(
        "<tr><th>From</th><td>{} &lt;{}&gt;</td></tr><tr><th>Kind</th><td>{}</td></tr>",
        html_escape(&sub.name),
        html_escape(&sub.email),
        sub.kind,
    );
    if let Some(s) = &sub.subject {
        let _ = writeln!(text, "Subject: {s}");
        let _ = write!(rows, "<tr><th>Subject</th><td>{}</td></tr>", html_escape(s));
    }
    for (key, value) in &sub.details {
        let _ = writeln!(text, "{key}: {value}");
        let _ = write!(
            rows,
            "<tr><th>{}</th><td>{}</td></tr>",
            html_escape(key),
            html_escape(value)
        );
    }
    let _ = write!(text, "\n{}\n", sub.message);
    let html = format!("<table>{rows}</table><p>{}</p>", html_paragraphs(&sub.message));

    OutgoingEmail {
        from: config.from.clone(),
        to: vec![config.owner_address.clone()],
        subject,
        text,
        html: Some(html),
        reply_to: Some(sub.email.clone()),
    }
}

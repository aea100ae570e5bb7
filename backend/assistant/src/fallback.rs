//! Canned replies used when no LLM is reachable.
//!
//! Rules are checked in order; the first rule with any keyword contained in the
//! lowercased message wins.

struct Rule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["hello", "hi ", "hey", "good morning", "good evening"],
        reply: "Hi there! I can tell you about projects, skills, experience, or how to get in touch. What would you like to know?",
    },
    Rule {
        keywords: &["project", "portfolio", "built", "work on"],
        reply: "Take a look at the Projects section for a curated list of recent work, each with a short write-up, the tech stack, and links to the code or live demo.",
    },
    Rule {
        keywords: &["skill", "tech", "stack", "language", "framework"],
        reply: "The Skills section breaks things down by frontend, backend, devops, and tooling, with a rough proficiency for each.",
    },
    Rule {
        keywords: &["experience", "background", "career", "resume", "cv"],
        reply: "The About section covers background and experience. For a full resume, send a note through the contact form.",
    },
    Rule {
        keywords: &["hire", "available", "freelance", "job", "opportunit", "rate"],
        reply: "New opportunities are always welcome! The contact form below is the quickest way to start a conversation.",
    },
    Rule {
        keywords: &["contact", "email", "reach", "touch", "message"],
        reply: "You can reach out through the contact form on this page. Messages usually get a reply within a day or two.",
    },
    Rule {
        keywords: &["blog", "article", "post", "writing"],
        reply: "The Blog section has articles on engineering topics and lessons learned from recent projects.",
    },
    Rule {
        keywords: &["newsletter", "subscribe", "updates"],
        reply: "Sign up for the newsletter at the bottom of the page to get new posts and project updates by email.",
    },
];

const DEFAULT_REPLY: &str = "I'm having trouble reaching my brain right now, but I can still point you around: check out the Projects, Skills, and Blog sections, or use the contact form to get in touch directly.";

/// Pick a canned reply for `message`.
pub fn canned_reply(message: &str) -> &'static str {
    // Pad so word-boundary keywords like "hi " also match at the end.
    let haystack = format!("{} ", message.to_lowercase());
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k)))
        .map(|rule| rule.reply)
        .unwrap_or(DEFAULT_REPLY)
}

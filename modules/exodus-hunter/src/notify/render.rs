// Lead message rendering. Output is Telegram HTML; every interpolated field
// is escaped.

use ai_client::truncate_to_char_boundary;
use telegram::escape_html;

use exodus_common::{ItemKind, Lead, LeadDetail, LinkButton, NotificationRecord, Verdict};

const TITLE_MAX_BYTES: usize = 300;
const RATIONALE_MAX_BYTES: usize = 600;
const PITCH_MAX_BYTES: usize = 1500;

fn field(text: &str, max_bytes: usize) -> String {
    let cut = truncate_to_char_boundary(text.trim(), max_bytes);
    if cut.len() < text.trim().len() {
        format!("{}…", escape_html(cut))
    } else {
        escape_html(cut)
    }
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .map(escape_html)
        .unwrap_or_else(|| "N/A".to_string())
}

fn render_contact(lead: &Lead, email: &str, zip: &str) -> String {
    let (phone, city, rating) = match &lead.item.kind {
        ItemKind::Business(fields) => (
            or_na(fields.phone.as_deref()),
            escape_html(&fields.city),
            fields
                .rating
                .map(|r| format!("{r:.1}"))
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        ItemKind::FeedEntry { .. } => ("N/A".into(), "N/A".into(), "N/A".into()),
    };

    format!(
        "💎 <b>GOD-TIER HQ LEAD</b>\n\n\
         🏢 <b>Name:</b> {name}\n\
         📧 <b>Email:</b> {email}\n\
         📞 <b>Phone:</b> {phone}\n\
         📍 <b>City:</b> {city} (Zip: {zip})\n\
         ⭐ <b>Rating:</b> {rating}\n\n\
         ✅ <i>Verified by Exodus MX-Check</i>",
        name = field(&lead.item.title, TITLE_MAX_BYTES),
        email = escape_html(email),
        zip = escape_html(zip),
    )
}

fn render_scored(lead: &Lead, verdict: &Verdict) -> String {
    let community = match &lead.item.kind {
        ItemKind::FeedEntry {
            community: Some(community),
            ..
        } => format!("📍 {}\n", escape_html(community)),
        _ => String::new(),
    };

    format!(
        "🔥 <b>NEW LEAD</b> (score {score:.0}/100)\n\n\
         📌 <b>{title}</b>\n\
         {community}\n\
         🧠 <b>Why:</b> {rationale}\n\n\
         ✉️ <b>Pitch:</b>\n<i>{pitch}</i>",
        score = verdict.score,
        title = field(&lead.item.title, TITLE_MAX_BYTES),
        rationale = field(&verdict.rationale, RATIONALE_MAX_BYTES),
        pitch = field(&verdict.pitch, PITCH_MAX_BYTES),
    )
}

/// Format an accepted lead for every configured recipient, with one button
/// linking back to the source item.
pub fn render_lead(lead: &Lead, recipients: &[String]) -> NotificationRecord {
    let (text, button_text) = match &lead.detail {
        LeadDetail::Contact { email, zip } => (render_contact(lead, email, zip), "📍 Open in Maps"),
        LeadDetail::Scored(verdict) => (render_scored(lead, verdict), "🔗 Open post"),
    };

    let button = (!lead.item.link.is_empty()).then(|| LinkButton {
        text: button_text.to_string(),
        url: lead.item.link.clone(),
    });

    NotificationRecord {
        text,
        button,
        recipients: recipients.to_vec(),
    }
}

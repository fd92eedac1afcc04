use serde::Deserialize;

use crate::config::Config;

/// Contest entry posted from the crossword page.
#[derive(Debug, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub organization: Option<String>,
}

impl Submission {
    /// Name of the first required field that is missing or blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name");
        }
        if self.email.trim().is_empty() {
            return Some("email");
        }
        if self.phone.trim().is_empty() {
            return Some("phone");
        }
        None
    }
}

/// Builds the Zoho Desk ticket payload for a contest entry. The description
/// is the Finnish HTML summary the support team reads when drawing winners.
pub fn build_ticket(submission: &Submission, ip: &str, config: &Config) -> serde_json::Value {
    let mut description = format!(
        "<h3>Jouluristikko - Vastaus</h3>\
         <p><strong>Nimi:</strong> {}</p>\
         <p><strong>Sähköposti:</strong> {}</p>\
         <p><strong>Puhelin:</strong> {}</p>",
        submission.name.trim(),
        submission.email.trim(),
        submission.phone.trim(),
    );
    if let Some(org) = submission
        .organization
        .as_deref()
        .map(str::trim)
        .filter(|org| !org.is_empty())
    {
        description.push_str(&format!(
            "<p><strong>Yritys/Organisaatio:</strong> {org}</p>"
        ));
    }
    let sent_at = chrono::Local::now().format("%d.%m.%Y %H.%M");
    description.push_str(&format!(
        "<p><strong>IP-osoite:</strong> {ip}</p>\
         <p><strong>Lähetysaika:</strong> {sent_at}</p>\
         <hr>\
         <p>Käyttäjä on täyttänyt jouluristikon ja osallistuu arvontaan.</p>"
    ));

    serde_json::json!({
        "subject": format!("Jouluristikko - {}", submission.name.trim()),
        "departmentId": config.zoho_department_id,
        "contactId": config.zoho_contact_id,
        "description": description,
        "status": "Open",
        "channel": "Web",
        "language": "fi-FI",
        "category": "Jouluristikko",
        "subCategory": "Arvonta",
    })
}

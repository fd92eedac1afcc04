use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const IP_SEEN_MESSAGE: &str = "Olet jo lähettänyt vastauksen tähän ristikkoon.";
const EMAIL_SEEN_MESSAGE: &str = "Sähköpostiosoitteella on jo lähetetty vastaus.";

#[derive(Default)]
struct Seen {
    ips: HashMap<String, Instant>,
    emails: HashMap<String, Instant>,
}

/// Tracks contest submissions per IP and per email inside a sliding window.
///
/// `check` answers "may this submission proceed" without consuming the slot;
/// `commit` records a submission only after the downstream ticket was
/// actually created, so a failed ticket does not lock the sender out.
pub struct SubmissionLimiter {
    seen: Mutex<Seen>,
    window: Duration,
}

impl SubmissionLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            seen: Mutex::new(Seen::default()),
            window,
        }
    }

    /// Returns `Err` with a user-facing message when the IP or the email
    /// has already submitted inside the window. Expired entries are pruned
    /// on every call.
    pub fn check(&self, ip: &str, email: &str) -> Result<(), &'static str> {
        self.check_at(ip, email, Instant::now())
    }

    /// Records a successful submission for both keys, restarting the window.
    pub fn commit(&self, ip: &str, email: &str) {
        self.commit_at(ip, email, Instant::now());
    }

    fn check_at(&self, ip: &str, email: &str, now: Instant) -> Result<(), &'static str> {
        let mut seen = self.seen.lock().unwrap();
        let window = self.window;
        seen.ips.retain(|_, at| now.duration_since(*at) < window);
        seen.emails.retain(|_, at| now.duration_since(*at) < window);

        if seen.ips.contains_key(ip) {
            return Err(IP_SEEN_MESSAGE);
        }
        if seen.emails.contains_key(&normalize_email(email)) {
            return Err(EMAIL_SEEN_MESSAGE);
        }
        Ok(())
    }

    fn commit_at(&self, ip: &str, email: &str, now: Instant) {
        let mut seen = self.seen.lock().unwrap();
        seen.ips.insert(ip.to_string(), now);
        seen.emails.insert(normalize_email(email), now);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn first_submission_is_allowed() {
        let limiter = SubmissionLimiter::new(DAY);
        assert!(limiter.check("10.0.0.1", "a@example.com").is_ok());
    }

    #[test]
    fn repeat_ip_is_rejected_even_with_new_email() {
        let limiter = SubmissionLimiter::new(DAY);
        limiter.commit("10.0.0.1", "a@example.com");
        let rejected = limiter.check("10.0.0.1", "b@example.com");
        assert_eq!(rejected, Err(IP_SEEN_MESSAGE));
    }

    #[test]
    fn repeat_email_is_rejected_even_with_new_ip() {
        let limiter = SubmissionLimiter::new(DAY);
        limiter.commit("10.0.0.1", "a@example.com");
        let rejected = limiter.check("10.0.0.2", "a@example.com");
        assert_eq!(rejected, Err(EMAIL_SEEN_MESSAGE));
    }

    #[test]
    fn email_matching_ignores_case_and_whitespace() {
        let limiter = SubmissionLimiter::new(DAY);
        limiter.commit("10.0.0.1", "A@Example.COM");
        assert!(limiter.check("10.0.0.2", "  a@example.com ").is_err());
    }

    #[test]
    fn entries_expire_after_the_window() {
        let limiter = SubmissionLimiter::new(DAY);
        let start = Instant::now();
        limiter.commit_at("10.0.0.1", "a@example.com", start);
        // One second shy of the window it still blocks.
        let almost = start + DAY - Duration::from_secs(1);
        assert!(limiter.check_at("10.0.0.1", "a@example.com", almost).is_err());
        let later = start + DAY + Duration::from_secs(1);
        assert!(limiter.check_at("10.0.0.1", "a@example.com", later).is_ok());
    }

    #[test]
    fn expired_entries_are_pruned_on_check() {
        let limiter = SubmissionLimiter::new(DAY);
        let start = Instant::now();
        limiter.commit_at("10.0.0.1", "a@example.com", start);
        limiter.check_at("10.0.0.2", "b@example.com", start + DAY + DAY).unwrap();
        let seen = limiter.seen.lock().unwrap();
        assert!(seen.ips.is_empty());
        assert!(seen.emails.is_empty());
    }

    #[test]
    fn commit_overwrites_instead_of_accumulating() {
        let limiter = SubmissionLimiter::new(DAY);
        let start = Instant::now();
        limiter.commit_at("10.0.0.1", "a@example.com", start);
        limiter.commit_at("10.0.0.1", "a@example.com", start + Duration::from_secs(60));
        let seen = limiter.seen.lock().unwrap();
        assert_eq!(seen.ips.len(), 1);
        assert_eq!(seen.emails.len(), 1);
        assert_eq!(seen.ips["10.0.0.1"], start + Duration::from_secs(60));
    }

    #[test]
    fn check_alone_does_not_consume_the_slot() {
        let limiter = SubmissionLimiter::new(DAY);
        assert!(limiter.check("10.0.0.1", "a@example.com").is_ok());
        assert!(limiter.check("10.0.0.1", "a@example.com").is_ok());
    }

    #[test]
    fn commit_extends_the_window() {
        let limiter = SubmissionLimiter::new(DAY);
        let start = Instant::now();
        limiter.commit_at("10.0.0.1", "a@example.com", start);
        limiter.commit_at("10.0.0.1", "a@example.com", start + Duration::from_secs(3600));
        // Past the first window end, but inside the extended one.
        let probe = start + DAY + Duration::from_secs(60);
        assert!(limiter.check_at("10.0.0.1", "a@example.com", probe).is_err());
    }
}

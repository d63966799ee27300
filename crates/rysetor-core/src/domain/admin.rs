/// The static allow-list of administrator email addresses.
///
/// Admins receive new-registration mail and are the only addresses accepted
/// by the approval workflow. Matching ignores surrounding whitespace and
/// ASCII case.
#[derive(Debug, Clone, Default)]
pub struct AdminRoster {
    emails: Vec<String>,
}

impl AdminRoster {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(Into::into)
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        let email = email.trim();
        self.emails.iter().any(|a| a.eq_ignore_ascii_case(email))
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

pub(crate) const ACCOUNT: &str = "account";
pub(crate) const NETWORK: &str = "network";
pub(crate) const VIEW: &str = "view";
pub(crate) const RETURN_URL: &str = "return_url";

/// Session key holding the draft of one action form.
pub(crate) fn form_key(form: &str) -> String {
    format!("form:{form}")
}

use reqwest::Url;

/// The one-time code carried by an email sign-in link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInLink {
    pub oob_code: String,
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn direct_link(url: &Url) -> Option<SignInLink> {
    if query_param(url, "mode")? != "signIn" {
        return None;
    }
    let oob_code = query_param(url, "oobCode").filter(|code| !code.is_empty())?;

    Some(SignInLink { oob_code })
}

/// Parses `url` as an email sign-in link.
///
/// Links rewritten by a redirector carry the real link in a `link` or
/// `deep_link_id` parameter; those are unwrapped.
pub fn parse_sign_in_link(url: &str) -> Option<SignInLink> {
    let url = Url::parse(url.trim()).ok()?;
    if let Some(link) = direct_link(&url) {
        return Some(link);
    }

    ["link", "deep_link_id"]
        .iter()
        .filter_map(|key| query_param(&url, key))
        .filter_map(|inner| Url::parse(&inner).ok())
        .find_map(|inner| direct_link(&inner))
}

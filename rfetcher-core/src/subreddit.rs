use url::Url;

/// Accepts either a bare subreddit name or a reddit URL and returns the name.
///
/// Input that is not recognisably a `reddit.com/r/<name>` link is returned
/// trimmed, unchanged.
pub fn extract_subreddit_name(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.to_ascii_lowercase().contains("reddit.com/r/") {
        return trimmed.to_string();
    }

    let parsed = Url::parse(trimmed).or_else(|_| Url::parse(&format!("https://{}", trimmed)));
    let Ok(url) = parsed else {
        return trimmed.to_string();
    };

    let mut segments = match url.path_segments() {
        Some(segments) => segments,
        None => return trimmed.to_string(),
    };

    while let Some(segment) = segments.next() {
        if segment == "r" {
            if let Some(name) = segments.next() {
                let name: String = name
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    return name;
                }
            }
            break;
        }
    }

    trimmed.to_string()
}
